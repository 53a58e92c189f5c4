//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements   | Connects to                  |
//! |------------|--------------|------------------------------|
//! | `log_sink` | EventSink    | Serial log output            |
//! | `nvs`      | ConfigPort   | NVS / in-memory store        |
//! | `wifi`     | WifiStation  | ESP-IDF Wi-Fi STA            |
//! |            |              | (plus the Network Monitor)   |

pub mod log_sink;
pub mod nvs;
pub mod wifi;
