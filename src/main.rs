//! FareBridge: bus passenger bridge firmware
//!
//! Runs a WiFi soft access point and an MFRC522 card reader, and streams
//! station join/leave and card tap events as NDJSON over the serial console
//! to the on-board host (a Raspberry Pi running the fare receiver).
//!
//! Everything happens in one task: the scheduler does a loop pass, then the
//! task sleeps for the pause the pass asked for.

#![no_std]
#![no_main]

extern crate alloc;

use esp_backtrace as _;

esp_bootloader_esp_idf::esp_app_desc!();

// Hardware-specific modules (binary crate only)
mod rc522;
mod softap;

use embassy_time::{Duration, Instant, Timer};
use embedded_hal_bus::spi::ExclusiveDevice;
use esp_hal::gpio::{Level, Output, OutputConfig};
use esp_hal::interrupt::software::SoftwareInterruptControl;
use esp_hal::spi::master::{Config as SpiConfig, Spi};
use esp_hal::spi::Mode;
use esp_hal::time::Rate;
use esp_hal::timer::timg::TimerGroup;

use farebridge::board;
use farebridge::comm::{HostLink, SERIAL_BAUD};
use farebridge::config::{ApConfig, BridgeConfig};
use farebridge::error::TransportError;
use farebridge::event::Timestamp;
use farebridge::protocol::VERSION;
use farebridge::scheduler::{Clock, Scheduler};

/// Monotonic clock from the embassy time driver.
struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_ms(&self) -> Timestamp {
        Instant::now().as_millis()
    }
}

/// Records go to the serial console, interleaved with log lines.
/// The host receiver skips any line that is not a JSON object.
struct ConsoleLink;

impl HostLink for ConsoleLink {
    fn write_line(&mut self, line: &[u8]) -> Result<(), TransportError> {
        let text = core::str::from_utf8(line).map_err(|_| TransportError::Write)?;
        esp_println::print!("{}", text);
        Ok(())
    }
}

// ── Entry point ──────────────────────────────────────────────────────

#[esp_rtos::main]
async fn main(_spawner: embassy_executor::Spawner) {
    esp_println::logger::init_logger_from_env();

    let peripherals = esp_hal::init(esp_hal::Config::default());

    // WiFi stack needs heap; ESP32 is tighter on DRAM.
    #[cfg(feature = "esp32")]
    {
        esp_alloc::heap_allocator!(size: 64 * 1024);
    }
    #[cfg(not(feature = "esp32"))]
    {
        esp_alloc::heap_allocator!(size: 96 * 1024);
    }

    // Start the RTOS, which needs a timer + software interrupt
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    let sw_int = SoftwareInterruptControl::new(peripherals.SW_INTERRUPT);
    esp_rtos::start(timg0.timer0, sw_int.software_interrupt0);

    log::info!("FareBridge v{} starting on {}", VERSION, board::BOARD_NAME);
    log::info!("Host link: serial console at {} baud", SERIAL_BAUD);

    // ── Soft access point ───────────────────────────────────────────────

    let ap = ApConfig::new();
    let stations = softap::start(peripherals.WIFI, &ap).await;

    // ── MFRC522 reader ──────────────────────────────────────────────────

    #[cfg(feature = "board-devkit")]
    let (sck, miso, mosi, ss, rst) = (
        peripherals.GPIO18,
        peripherals.GPIO19,
        peripherals.GPIO23,
        peripherals.GPIO5,
        peripherals.GPIO22,
    );
    #[cfg(feature = "board-xiao")]
    let (sck, miso, mosi, ss, rst) = (
        peripherals.GPIO7,
        peripherals.GPIO8,
        peripherals.GPIO9,
        peripherals.GPIO2,
        peripherals.GPIO3,
    );

    let spi_config = SpiConfig::default()
        .with_frequency(Rate::from_mhz(board::RC522_SPI_FREQ_MHZ))
        .with_mode(Mode::_0);
    let spi = Spi::new(peripherals.SPI2, spi_config)
        .expect("SPI init failed")
        .with_sck(sck)
        .with_miso(miso)
        .with_mosi(mosi);

    // Wrap SpiBus + CS into SpiDevice
    let cs = Output::new(ss, Level::High, OutputConfig::default());
    let spi_device = ExclusiveDevice::new_no_delay(spi, cs).expect("SPI device init failed");
    let rst = Output::new(rst, Level::High, OutputConfig::default());
    let reader = rc522::Rc522Reader::new(spi_device, rst);

    log::info!(
        "MFRC522 on SCK={} MISO={} MOSI={} SS={} RST={}",
        board::RC522_SCK_PIN,
        board::RC522_MISO_PIN,
        board::RC522_MOSI_PIN,
        board::RC522_SS_PIN,
        board::RC522_RST_PIN,
    );

    // ── Event loop ──────────────────────────────────────────────────────

    let config = BridgeConfig::new();
    log::info!(
        "Station tick {} ms, settle {} ms, loop yield {} ms",
        config.station_tick_ms,
        config.settle_ms,
        config.loop_yield_ms
    );

    let mut scheduler = Scheduler::new(stations, reader, ConsoleLink, EmbassyClock, config);

    loop {
        let pass = scheduler.run_iteration();
        Timer::after(Duration::from_millis(pass.pause_ms as u64)).await;
    }
}
