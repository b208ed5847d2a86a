/// MFRC522 contactless reader on SPI.
///
/// Presence is a REQA (only idle cards answer), the serial comes from
/// anticollision + select, and release is HLTA. A halted card stays silent
/// until it leaves the field, so a held card is read once.
use embedded_hal::spi::SpiDevice;
use esp_hal::delay::Delay;
use esp_hal::gpio::Output;
use mfrc522::comm::blocking::spi::SpiInterface;
use mfrc522::{AtqA, Initialized, Mfrc522};

use farebridge::card::ProximityReader;
use farebridge::event::UidBytes;

pub struct Rc522Reader<SPI: SpiDevice> {
    chip: Mfrc522<SpiInterface<SPI>, Initialized>,
    /// Answer to the last successful REQA, consumed by select
    atqa: Option<AtqA>,
    _rst: Output<'static>,
}

impl<SPI: SpiDevice> Rc522Reader<SPI>
where
    SPI::Error: core::fmt::Debug,
{
    /// Hard-reset the chip through RST, then run the soft init sequence.
    ///
    /// Panics if the chip does not come up: the bridge has no use without it.
    pub fn new(spi: SPI, mut rst: Output<'static>) -> Self {
        let delay = Delay::new();
        rst.set_low();
        delay.delay_millis(10);
        rst.set_high();
        delay.delay_millis(50);

        let mut chip = Mfrc522::new(SpiInterface::new(spi))
            .init()
            .expect("MFRC522 init failed");

        match chip.version() {
            Ok(v) if v == 0x00 || v == 0xFF => {
                log::error!("MFRC522 version 0x{:02X}: check SPI wiring", v)
            }
            Ok(v) => log::info!("MFRC522 ready, version 0x{:02X}", v),
            Err(e) => log::error!("MFRC522 version read failed: {:?}", e),
        }

        Self {
            chip,
            atqa: None,
            _rst: rst,
        }
    }
}

impl<SPI: SpiDevice> ProximityReader for Rc522Reader<SPI>
where
    SPI::Error: core::fmt::Debug,
{
    fn is_card_present(&mut self) -> bool {
        self.atqa = self.chip.new_card_present().ok();
        self.atqa.is_some()
    }

    fn read_card_serial(&mut self) -> Option<UidBytes> {
        let atqa = self.atqa.take()?;
        match self.chip.select(&atqa) {
            Ok(uid) => UidBytes::from_slice(uid.as_bytes()).ok(),
            Err(e) => {
                log::debug!("Card select failed: {:?}", e);
                None
            }
        }
    }

    fn release_card(&mut self) {
        if let Err(e) = self.chip.hlta() {
            log::debug!("HLTA failed: {:?}", e);
        }
    }
}
