//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements     | Connects to                         |
//! |-------------|----------------|-------------------------------------|
//! | `hardware`  | SensorPort     | any sensor + backlight pair         |
//! |             | BacklightPort  |                                     |
//! | `history`   | HistoryPort    | CSV file                            |
//! | `log_sink`  | EventSink      | `log` facade                        |
//! | `sysfs`     | BacklightPort  | `/sys/class/backlight`              |
//! |             | SensorPort     | IIO illuminance channel             |
//! | `time`      | -              | system wall clock                   |
//! | `tracked`   | BacklightPort  | shared backlight + external polling |

pub mod hardware;
pub mod history;
pub mod log_sink;
pub mod sysfs;
pub mod time;
pub mod tracked;
