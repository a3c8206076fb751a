// THEORY (Single-Pixel Color Transforms):
// The `Pixel` module is the most fundamental unit of the inspection engine. It is a
// "dumb" data container for one RGB sample plus the two single-pixel transforms the
// feature extractor needs: an 8-bit intensity for texture analysis and an 8-bit
// hue/saturation/value triple for the color signature. Nothing here reads neighbors;
// anything spatial (blur, Laplacian) lives in `texture`, anything statistical
// (histograms) lives in `histogram`.
//
// Both transforms are computed in fixed-point integer arithmetic so that every image,
// whatever its resolution or source, lands in exactly the same discrete buckets:
// - Intensity: Rec. 601 luma, `0.299 R + 0.587 G + 0.114 B`, 14-bit fixed point with
//   round-half-up. Range 0..=255.
// - HSV (8-bit): V = max, S = 255 * chroma / V, H = hue degrees / 2. H fits 0..180 so
//   it keeps one bin per two degrees without overflowing a byte.

pub mod pixel {
    pub type Channel = u8;
    pub type Intensity = u8;
    pub type Hue = u8;
    pub type Saturation = u8;
    pub type Value = u8;

    /// Exclusive upper bound of the 8-bit hue channel.
    pub const HUE_RANGE: u32 = 180;
    /// Exclusive upper bound of the 8-bit saturation channel.
    pub const SATURATION_RANGE: u32 = 256;

    const LUMA_SHIFT: u32 = 14;
    const LUMA_RED: u32 = 4899;
    const LUMA_GREEN: u32 = 9617;
    const LUMA_BLUE: u32 = 1868;

    /// A "dumb" data container representing a single RGB pixel.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Pixel {
        /// The red channel value (0-255).
        pub red: Channel,
        /// The green channel value (0-255).
        pub green: Channel,
        /// The blue channel value (0-255).
        pub blue: Channel,
    }

    /// Hue, saturation and value packed into bytes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Hsv {
        /// Hue in half-degrees, 0..180.
        pub hue: Hue,
        /// Saturation, 0..=255.
        pub saturation: Saturation,
        /// Value (max channel), 0..=255.
        pub value: Value,
    }

    impl Pixel {
        pub fn new(red: Channel, green: Channel, blue: Channel) -> Self {
            Pixel { red, green, blue }
        }

        /// Perceived brightness as a single byte (Rec. 601 luma).
        pub fn intensity(&self) -> Intensity {
            let weighted = LUMA_RED * self.red as u32
                + LUMA_GREEN * self.green as u32
                + LUMA_BLUE * self.blue as u32;
            ((weighted + (1 << (LUMA_SHIFT - 1))) >> LUMA_SHIFT) as Intensity
        }

        /// 8-bit HSV transform.
        ///
        /// - Gray pixels (zero chroma) get hue 0 and saturation 0.
        /// - Black gets saturation 0 rather than dividing by a zero value.
        pub fn hsv(&self) -> Hsv {
            let red = self.red as i32;
            let green = self.green as i32;
            let blue = self.blue as i32;

            let value = red.max(green).max(blue);
            let minimum = red.min(green).min(blue);
            let chroma = value - minimum;

            let saturation = if value == 0 {
                0
            } else {
                (255 * chroma + value / 2) / value
            };

            let hue = if chroma == 0 {
                0
            } else {
                let sector = if value == red {
                    green - blue
                } else if value == green {
                    blue - red + 2 * chroma
                } else {
                    red - green + 4 * chroma
                };
                // 30 half-degrees per unit of the sector offset, rounded half up.
                let scaled = (sector * 60 + chroma).div_euclid(2 * chroma);
                if scaled < 0 { scaled + HUE_RANGE as i32 } else { scaled }
            };

            Hsv {
                hue: hue.min(HUE_RANGE as i32 - 1) as Hue,
                saturation: saturation as Saturation,
                value: value as Value,
            }
        }
    }

    impl From<image::Rgb<u8>> for Pixel {
        fn from(rgb: image::Rgb<u8>) -> Self {
            let [red, green, blue] = rgb.0;
            Pixel::new(red, green, blue)
        }
    }

    impl From<&image::Rgb<u8>> for Pixel {
        fn from(rgb: &image::Rgb<u8>) -> Self {
            Pixel::from(*rgb)
        }
    }
}
