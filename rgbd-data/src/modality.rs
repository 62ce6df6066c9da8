//! Modality contracts: expected codec, channel count, and format tag for
//! each of the three input kinds making up a sample.

use std::fmt;

/// Encoded image codec understood by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

impl ImageFormat {
    /// Map to the codec selector of the underlying image library.
    pub fn as_image_format(self) -> image::ImageFormat {
        match self {
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
            ImageFormat::Png => image::ImageFormat::Png,
        }
    }
}

/// Depth-map encoding convention.
///
/// Source data conventions vary, so this is dataset configuration rather
/// than a constant. `JpegRgb` matches this dataset's published archives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DepthEncoding {
    /// Depth stored as a 3-channel JPEG.
    #[default]
    JpegRgb,
    /// Depth stored as a single-channel PNG.
    PngGray,
}

/// One of the three input kinds making up a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modality {
    /// RGB photograph.
    Image,
    /// Semantic label mask.
    Label,
    /// Depth map.
    Depth,
}

/// Decode contract for one modality: the codec its bytes must parse as,
/// the channel count the decode must yield, and the format tag recorded
/// in the persisted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModalityContract {
    pub format: ImageFormat,
    pub channels: u8,
    pub tag: &'static str,
}

impl Modality {
    /// All modalities, in record-key order.
    pub const ALL: [Modality; 3] = [Modality::Image, Modality::Label, Modality::Depth];

    /// Record-key prefix (`image/encoded`, `label/height`, ...).
    pub fn key_prefix(&self) -> &'static str {
        match self {
            Modality::Image => "image",
            Modality::Label => "label",
            Modality::Depth => "depth",
        }
    }

    /// The decode contract this modality's bytes must satisfy.
    ///
    /// Image and label contracts are fixed by the dataset layout; the depth
    /// contract follows the configured encoding convention.
    pub fn contract(&self, depth_encoding: DepthEncoding) -> ModalityContract {
        match self {
            Modality::Image => ModalityContract {
                format: ImageFormat::Jpeg,
                channels: 3,
                tag: "jpg",
            },
            Modality::Label => ModalityContract {
                format: ImageFormat::Png,
                channels: 1,
                tag: "png",
            },
            Modality::Depth => match depth_encoding {
                DepthEncoding::JpegRgb => ModalityContract {
                    format: ImageFormat::Jpeg,
                    channels: 3,
                    tag: "jpeg",
                },
                DepthEncoding::PngGray => ModalityContract {
                    format: ImageFormat::Png,
                    channels: 1,
                    tag: "png",
                },
            },
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.key_prefix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_contract_is_three_channel_jpeg() {
        let contract = Modality::Image.contract(DepthEncoding::default());
        assert_eq!(contract.format, ImageFormat::Jpeg);
        assert_eq!(contract.channels, 3);
        assert_eq!(contract.tag, "jpg");
    }

    #[test]
    fn test_label_contract_is_single_channel_png() {
        let contract = Modality::Label.contract(DepthEncoding::default());
        assert_eq!(contract.format, ImageFormat::Png);
        assert_eq!(contract.channels, 1);
        assert_eq!(contract.tag, "png");
    }

    #[test]
    fn test_depth_contract_follows_encoding_convention() {
        let jpeg = Modality::Depth.contract(DepthEncoding::JpegRgb);
        assert_eq!(jpeg.format, ImageFormat::Jpeg);
        assert_eq!(jpeg.channels, 3);
        assert_eq!(jpeg.tag, "jpeg");

        let png = Modality::Depth.contract(DepthEncoding::PngGray);
        assert_eq!(png.format, ImageFormat::Png);
        assert_eq!(png.channels, 1);
        assert_eq!(png.tag, "png");
    }

    #[test]
    fn test_depth_encoding_defaults_to_jpeg() {
        assert_eq!(DepthEncoding::default(), DepthEncoding::JpegRgb);
    }

    #[test]
    fn test_key_prefixes() {
        let prefixes: Vec<&str> = Modality::ALL.iter().map(|m| m.key_prefix()).collect();
        assert_eq!(prefixes, ["image", "label", "depth"]);
    }
}
