use anyhow::{anyhow, Result};
use esp_idf_svc::wifi::{
    AccessPointConfiguration, AuthMethod, BlockingWifi, ClientConfiguration, Configuration as WifiCfg, EspWifi,
};
use std::net::Ipv4Addr;
use std::thread;
use std::time::Duration;

use crate::config;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Link {
    Station(Ipv4Addr),
    /// eigenes Netz, Station nicht erreichbar
    AccessPoint(Ipv4Addr),
}

/// Station mode first; falls back to an own access point so the field page
/// stays reachable when the farm network is down.
pub fn bring_up(wifi: &mut BlockingWifi<EspWifi<'static>>) -> Result<Link> {
    if !config::WIFI_SSID.is_empty() {
        match station(wifi) {
            Ok(ip) => return Ok(Link::Station(ip)),
            Err(e) => log::warn!("WiFi station failed ({e:?}), starting access point"),
        }
        let _ = wifi.stop();
    }
    access_point(wifi).map(Link::AccessPoint)
}

fn station(wifi: &mut BlockingWifi<EspWifi<'static>>) -> Result<Ipv4Addr> {
    wifi.set_configuration(&WifiCfg::Client(ClientConfiguration {
        ssid: config::WIFI_SSID.try_into().map_err(|_| anyhow!("ssid too long"))?,
        password: config::WIFI_PASS.try_into().map_err(|_| anyhow!("password too long"))?,
        ..Default::default()
    }))?;
    wifi.start()?;
    unsafe {
        esp_idf_sys::esp_wifi_set_ps(esp_idf_sys::wifi_ps_type_t_WIFI_PS_NONE);
    }
    wifi.connect()?;
    wifi.wait_netif_up()?;

    // IP über das Wrapper-Objekt (kein Parallel-Borrow von esp_wifi)
    let ip_info = wifi.wifi().sta_netif().get_ip_info()?;
    log::info!("WiFi connected. IP: {}", ip_info.ip);
    Ok(ip_info.ip)
}

fn access_point(wifi: &mut BlockingWifi<EspWifi<'static>>) -> Result<Ipv4Addr> {
    wifi.set_configuration(&WifiCfg::AccessPoint(AccessPointConfiguration {
        ssid: config::AP_SSID.try_into().map_err(|_| anyhow!("ap ssid too long"))?,
        password: config::AP_PASS.try_into().map_err(|_| anyhow!("ap password too long"))?,
        auth_method: AuthMethod::WPA2Personal,
        channel: 1,
        ..Default::default()
    }))?;
    wifi.start()?;
    wifi.wait_netif_up()?;

    let ip_info = wifi.wifi().ap_netif().get_ip_info()?;
    log::info!("Access point {} up. IP: {}", config::AP_SSID, ip_info.ip);
    Ok(ip_info.ip)
}

/// Reconnect-„Watchdog“. Kehrt nie zurück; im AP-Betrieb gibt es nichts zu tun.
pub fn watch(wifi: &mut BlockingWifi<EspWifi<'static>>, link: Link) -> ! {
    loop {
        thread::sleep(Duration::from_secs(5));
        if matches!(link, Link::AccessPoint(_)) || wifi.is_connected().unwrap_or(false) {
            continue;
        }
        let _ = wifi.connect();
        let _ = wifi.wait_netif_up();
        if let Ok(info) = wifi.wifi().sta_netif().get_ip_info() {
            log::warn!("WiFi reconnected. IP: {}", info.ip);
        } else {
            log::warn!("WiFi reconnected.");
        }
    }
}
