//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter      | Implements                  | Connects to                    |
//! |--------------|-----------------------------|--------------------------------|
//! | `hardware`   | IndicatorPort, ButtonPort   | GPIO cdev or simulated pins    |
//! | `dht11`      | SensorPort                  | DHT11 via the kernel IIO driver|
//! | `log_sink`   | EventSink                   | `log` facade                   |
//! | `mirror`     | MirrorPort                  | realtime JSON store over HTTP  |
//! | `tag_reader` | TagReader                   | line-oriented RFID reader      |

pub mod dht11;
pub mod hardware;
pub mod log_sink;
pub mod mirror;
pub mod tag_reader;
