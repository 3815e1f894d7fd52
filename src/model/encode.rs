//! Layout vocabulary to controller codes
//!
//! Layouts describe ports with strings ("ws2811", "GRB", "Reverse");
//! the controller wants small integers.

/// Pixel protocol code, `None` when the controller has no such protocol
pub fn encode_protocol(protocol: &str) -> Option<u32> {
    match protocol.to_ascii_lowercase().as_str() {
        "ws2811" => Some(1),
        "ws2812" => Some(2),
        "ws2812b" => Some(3),
        "ws2813" => Some(4),
        "ws2801" => Some(5),
        "tls3001" => Some(6),
        "apa102" => Some(7),
        _ => None,
    }
}

/// Colour order code, `None` for orders the controller cannot drive
pub fn encode_color_order(order: &str) -> Option<u32> {
    match order.to_ascii_lowercase().as_str() {
        "rgb" => Some(0),
        "rbg" => Some(1),
        "grb" => Some(2),
        "gbr" => Some(3),
        "brg" => Some(4),
        "bgr" => Some(5),
        "rgbw" => Some(6),
        "wrgb" => Some(7),
        _ => None,
    }
}

/// Channels per pixel for a colour order code
pub fn bytes_per_pixel(color_order: u32) -> u32 {
    match color_order {
        6 | 7 => 4,
        _ => 3,
    }
}

/// Brightness steps are 100, 90, ... 20, 15
///
/// Anything under 20 lands on 15; the hardware has no 10 or 0 step.
pub fn encode_brightness(brightness: u32) -> u32 {
    let stepped = (brightness.min(100) / 10) * 10;
    if stepped < 20 {
        15
    } else {
        stepped
    }
}

/// Gamma is an integer 1-4
pub fn encode_gamma(gamma: u32) -> u32 {
    gamma.min(4)
}

/// Port direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Forward,
    Reverse,
}

impl Direction {
    /// Layouts spell it "Forward" / "Reverse"
    pub fn from_layout(direction: &str) -> Self {
        if direction == "Reverse" {
            Self::Reverse
        } else {
            Self::Forward
        }
    }

    pub fn from_code(code: u32) -> Self {
        if code == 1 {
            Self::Reverse
        } else {
            Self::Forward
        }
    }

    pub fn code(self) -> u32 {
        match self {
            Self::Forward => 0,
            Self::Reverse => 1,
        }
    }
}

/// Board fitted in an expansion slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpansionType {
    #[default]
    NotPresent,
    /// Local SPI pixel board
    LocalSpi,
    /// Long-range differential board (smart remotes)
    LongRange,
    /// Local AC dimmer board
    LocalAc,
}

impl ExpansionType {
    /// Decode the `BDn` board-info letter
    pub fn decode(code: &str) -> Self {
        match code {
            "S" => Self::LocalSpi,
            "L" => Self::LongRange,
            "A" => Self::LocalAc,
            _ => Self::NotPresent,
        }
    }

    /// Boards whose ports take pixel configuration
    pub fn drives_pixels(self) -> bool {
        matches!(self, Self::LocalSpi | Self::LongRange)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_brightness_steps() {
        assert_eq!(encode_brightness(100), 100);
        assert_eq!(encode_brightness(99), 90);
        assert_eq!(encode_brightness(25), 20);
        assert_eq!(encode_brightness(19), 15);
        assert_eq!(encode_brightness(0), 15);
        assert_eq!(encode_brightness(250), 100);
    }

    #[test]
    fn test_protocol_codes_are_case_insensitive() {
        assert_eq!(encode_protocol("WS2811"), Some(1));
        assert_eq!(encode_protocol("apa102"), Some(7));
        assert_eq!(encode_protocol("dmx"), None);
    }

    #[test]
    fn test_white_channel_orders_use_four_bytes() {
        assert_eq!(bytes_per_pixel(encode_color_order("RGBW").unwrap()), 4);
        assert_eq!(bytes_per_pixel(encode_color_order("wrgb").unwrap()), 4);
        assert_eq!(bytes_per_pixel(encode_color_order("GRB").unwrap()), 3);
    }

    #[test]
    fn test_direction_and_gamma() {
        assert_eq!(Direction::from_layout("Reverse").code(), 1);
        assert_eq!(Direction::from_layout("Forward").code(), 0);
        assert_eq!(encode_gamma(7), 4);
        assert_eq!(encode_gamma(2), 2);
    }

    #[test]
    fn test_expansion_decode() {
        assert_eq!(ExpansionType::decode("L"), ExpansionType::LongRange);
        assert_eq!(ExpansionType::decode("N"), ExpansionType::NotPresent);
        assert!(ExpansionType::LocalSpi.drives_pixels());
        assert!(!ExpansionType::LocalAc.drives_pixels());
    }

    proptest! {
        #[test]
        fn brightness_encoding_is_idempotent(x in 0u32..10_000) {
            let once = encode_brightness(x);
            prop_assert_eq!(encode_brightness(once), once);
            prop_assert!(once == 15 || (once % 10 == 0 && (20..=100).contains(&once)));
        }
    }
}
