pub mod widget;

pub use widget::{ ConfigError, TelephonyConfig, WidgetConfig };
