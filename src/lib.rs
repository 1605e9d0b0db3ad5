//! Bewässerungsknoten fürs Feld: Boden/Tank/Regen messen, Pumpe schalten,
//! Kulturempfehlung nach Saison, Bedienung per HTTP.

pub mod config;
pub mod control;
pub mod crops;
pub mod dashboard;
pub mod i18n;
pub mod logbuf;
pub mod node;
pub mod page;
pub mod report;
pub mod season;
pub mod sensor;
pub mod sim;
pub mod web;

#[cfg(feature = "esp32")]
pub mod hw;
#[cfg(feature = "esp32")]
pub mod net;
