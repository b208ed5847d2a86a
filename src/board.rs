/// Hardware abstraction for supported boards.
///
/// Each board module defines the MFRC522 wiring and identity
/// selected at compile time via feature flags. The firmware binds the
/// matching esp-hal GPIO peripherals; these constants are for logs and docs.

#[cfg(feature = "board-devkit")]
mod hw {
    // MFRC522 on VSPI (SPI2 in esp-hal)
    pub const RC522_SCK_PIN: u8 = 18;
    pub const RC522_MISO_PIN: u8 = 19;
    pub const RC522_MOSI_PIN: u8 = 23;
    pub const RC522_SS_PIN: u8 = 5;
    pub const RC522_RST_PIN: u8 = 22;
    pub const BOARD_NAME: &str = "esp32_devkitc";
}

#[cfg(feature = "board-xiao")]
mod hw {
    // MFRC522 on the D8/D9/D10 SPI header
    pub const RC522_SCK_PIN: u8 = 7;
    pub const RC522_MISO_PIN: u8 = 8;
    pub const RC522_MOSI_PIN: u8 = 9;
    pub const RC522_SS_PIN: u8 = 2;
    pub const RC522_RST_PIN: u8 = 3;
    pub const BOARD_NAME: &str = "xiao_esp32s3";
}

#[cfg(not(any(feature = "board-devkit", feature = "board-xiao")))]
mod hw {
    pub const BOARD_NAME: &str = "unknown";
}

pub use hw::*;

/// MFRC522 SPI clock. The chip tops out at 10 MHz; 4 MHz tolerates jumper wires.
pub const RC522_SPI_FREQ_MHZ: u32 = 4;
