/// WiFi soft access point and its associated-station table.
///
/// Passengers' phones join the AP; the bridge never routes their traffic.
/// The station table is read straight from the WiFi driver each tick.
use core::ptr;

use esp_radio::wifi::{AccessPointConfig, AuthMethod, Interfaces, ModeConfig, WifiController};

use farebridge::config::ApConfig;
use farebridge::error::RadioError;
use farebridge::event::PeerId;
use farebridge::station::{Snapshot, StationSource};

/// Station limit compiled into the ESP-IDF WiFi driver
const ESP_WIFI_MAX_CONN_NUM: usize = 15;

// Mirrors `wifi_sta_info_t` / `wifi_sta_list_t` from esp_wifi_types.h.
// Layout checked against the ESP-IDF v5.1 header (ESP_WIFI_MAX_CONN_NUM = 15).
// Recheck when esp-radio moves its WiFi blobs to a new IDF release.
#[repr(C)]
#[derive(Clone, Copy)]
struct WifiStaInfo {
    mac: [u8; 6],
    rssi: i8,
    // phy_11b, phy_11g, phy_11n, phy_lr, phy_11ax, is_mesh_child bitfield
    flags: u32,
}

#[repr(C)]
struct WifiStaList {
    sta: [WifiStaInfo; ESP_WIFI_MAX_CONN_NUM],
    num: i32,
}

// FFI binding for the AP station table.
// The symbol is linked via esp-radio's WiFi driver.
unsafe extern "C" {
    fn esp_wifi_ap_get_sta_list(sta: *mut WifiStaList) -> i32;
}

/// Running access point. Holding it keeps the radio up.
pub struct StationTable {
    _controller: WifiController<'static>,
    _interfaces: Interfaces<'static>,
}

/// Bring the radio up in access-point mode.
///
/// Panics on driver failure: nothing useful runs without the radio.
pub async fn start(wifi: esp_hal::peripherals::WIFI<'static>, ap: &ApConfig) -> StationTable {
    let (mut controller, interfaces) =
        esp_radio::wifi::new(wifi, Default::default()).expect("WiFi init failed");

    let auth_method = if ap.is_open() {
        log::warn!("AP password shorter than 8 bytes, running an open network");
        AuthMethod::None
    } else {
        AuthMethod::Wpa2Personal
    };

    let mut ap_config = AccessPointConfig::default()
        .with_ssid(ap.ssid.into())
        .with_channel(ap.channel)
        .with_auth_method(auth_method)
        .with_max_connections(ap.max_connections);
    if !ap.is_open() {
        ap_config = ap_config.with_password(ap.password.into());
    }

    controller
        .set_config(&ModeConfig::AccessPoint(ap_config))
        .expect("AP configuration rejected");
    controller.start_async().await.expect("WiFi start failed");

    log::info!(
        "Access point '{}' up on channel {} (max {} stations)",
        ap.ssid,
        ap.channel,
        ap.max_connections
    );

    StationTable {
        _controller: controller,
        _interfaces: interfaces,
    }
}

impl StationSource for StationTable {
    fn associated_peers(&mut self) -> Result<Snapshot, RadioError> {
        let mut list = WifiStaList {
            sta: [WifiStaInfo {
                mac: [0; 6],
                rssi: 0,
                flags: 0,
            }; ESP_WIFI_MAX_CONN_NUM],
            num: 0,
        };

        let status = unsafe { esp_wifi_ap_get_sta_list(ptr::addr_of_mut!(list)) };
        if status != 0 {
            return Err(RadioError::QueryFailed(status));
        }

        let count = (list.num.max(0) as usize).min(ESP_WIFI_MAX_CONN_NUM);
        let mut snapshot = Snapshot::new();
        for sta in &list.sta[..count] {
            let _ = snapshot.push(PeerId::new(sta.mac));
        }
        Ok(snapshot)
    }
}
