use crate::assets::Resource;

/// Texture dimensionality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureKind {
    /// Plain 2D texture (possibly an array).
    #[default]
    D2,
    /// Volume texture.
    D3,
    /// Cube map; array layers count faces.
    Cube,
}

impl TextureKind {
    /// Maps the `.kwt` type field.
    #[must_use]
    pub fn from_file_value(value: u32) -> Option<Self> {
        match value {
            0 => Some(TextureKind::D2),
            1 => Some(TextureKind::D3),
            2 => Some(TextureKind::Cube),
            _ => None,
        }
    }
}

/// Pixel formats a `.kwt` file may carry.
///
/// Compressed formats are the BC family; uncompressed formats cover the
/// usual 8/16/32-bit unorm/snorm/uint/sint/float layouts plus depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[allow(missing_docs)]
pub enum TextureFormat {
    #[default]
    R8Unorm,
    R8Snorm,
    R8Uint,
    R8Sint,
    Rg8Unorm,
    Rg8Snorm,
    Rg8Uint,
    Rg8Sint,
    Rgba8Unorm,
    Rgba8Snorm,
    Rgba8Uint,
    Rgba8Sint,
    R16Uint,
    R16Sint,
    R16Float,
    Rg16Uint,
    Rg16Sint,
    Rg16Float,
    Rgba16Uint,
    Rgba16Sint,
    Rgba16Float,
    R32Uint,
    R32Sint,
    R32Float,
    Rg32Uint,
    Rg32Sint,
    Rg32Float,
    Rgba32Uint,
    Rgba32Sint,
    Rgba32Float,
    Bc1Unorm,
    Bc2Unorm,
    Bc3Unorm,
    Bc4Unorm,
    Bc4Snorm,
    Bc5Unorm,
    Bc5Snorm,
    Bc6hUfloat,
    Bc6hSfloat,
    Bc7Unorm,
    Depth16Unorm,
    Depth32Float,
    Depth24UnormStencil8,
}

impl TextureFormat {
    const ALL: [TextureFormat; 43] = [
        TextureFormat::R8Unorm,
        TextureFormat::R8Snorm,
        TextureFormat::R8Uint,
        TextureFormat::R8Sint,
        TextureFormat::Rg8Unorm,
        TextureFormat::Rg8Snorm,
        TextureFormat::Rg8Uint,
        TextureFormat::Rg8Sint,
        TextureFormat::Rgba8Unorm,
        TextureFormat::Rgba8Snorm,
        TextureFormat::Rgba8Uint,
        TextureFormat::Rgba8Sint,
        TextureFormat::R16Uint,
        TextureFormat::R16Sint,
        TextureFormat::R16Float,
        TextureFormat::Rg16Uint,
        TextureFormat::Rg16Sint,
        TextureFormat::Rg16Float,
        TextureFormat::Rgba16Uint,
        TextureFormat::Rgba16Sint,
        TextureFormat::Rgba16Float,
        TextureFormat::R32Uint,
        TextureFormat::R32Sint,
        TextureFormat::R32Float,
        TextureFormat::Rg32Uint,
        TextureFormat::Rg32Sint,
        TextureFormat::Rg32Float,
        TextureFormat::Rgba32Uint,
        TextureFormat::Rgba32Sint,
        TextureFormat::Rgba32Float,
        TextureFormat::Bc1Unorm,
        TextureFormat::Bc2Unorm,
        TextureFormat::Bc3Unorm,
        TextureFormat::Bc4Unorm,
        TextureFormat::Bc4Snorm,
        TextureFormat::Bc5Unorm,
        TextureFormat::Bc5Snorm,
        TextureFormat::Bc6hUfloat,
        TextureFormat::Bc6hSfloat,
        TextureFormat::Bc7Unorm,
        TextureFormat::Depth16Unorm,
        TextureFormat::Depth32Float,
        TextureFormat::Depth24UnormStencil8,
    ];

    /// Maps the `.kwt` format field.
    #[must_use]
    pub fn from_file_value(value: u32) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }

    /// Whether the format is block-compressed.
    #[must_use]
    pub fn is_compressed(self) -> bool {
        matches!(
            self,
            TextureFormat::Bc1Unorm
                | TextureFormat::Bc2Unorm
                | TextureFormat::Bc3Unorm
                | TextureFormat::Bc4Unorm
                | TextureFormat::Bc4Snorm
                | TextureFormat::Bc5Unorm
                | TextureFormat::Bc5Snorm
                | TextureFormat::Bc6hUfloat
                | TextureFormat::Bc6hSfloat
                | TextureFormat::Bc7Unorm
        )
    }

    /// Bytes per 4x4 block for compressed formats, bytes per pixel
    /// otherwise.
    #[must_use]
    pub fn unit_size(self) -> usize {
        match self {
            TextureFormat::R8Unorm
            | TextureFormat::R8Snorm
            | TextureFormat::R8Uint
            | TextureFormat::R8Sint => 1,
            TextureFormat::Rg8Unorm
            | TextureFormat::Rg8Snorm
            | TextureFormat::Rg8Uint
            | TextureFormat::Rg8Sint
            | TextureFormat::R16Uint
            | TextureFormat::R16Sint
            | TextureFormat::R16Float
            | TextureFormat::Depth16Unorm => 2,
            TextureFormat::Rgba8Unorm
            | TextureFormat::Rgba8Snorm
            | TextureFormat::Rgba8Uint
            | TextureFormat::Rgba8Sint
            | TextureFormat::Rg16Uint
            | TextureFormat::Rg16Sint
            | TextureFormat::Rg16Float
            | TextureFormat::R32Uint
            | TextureFormat::R32Sint
            | TextureFormat::R32Float
            | TextureFormat::Depth32Float
            | TextureFormat::Depth24UnormStencil8 => 4,
            TextureFormat::Rgba16Uint
            | TextureFormat::Rgba16Sint
            | TextureFormat::Rgba16Float
            | TextureFormat::Rg32Uint
            | TextureFormat::Rg32Sint
            | TextureFormat::Rg32Float
            | TextureFormat::Bc1Unorm
            | TextureFormat::Bc4Unorm
            | TextureFormat::Bc4Snorm => 8,
            TextureFormat::Rgba32Uint
            | TextureFormat::Rgba32Sint
            | TextureFormat::Rgba32Float
            | TextureFormat::Bc2Unorm
            | TextureFormat::Bc3Unorm
            | TextureFormat::Bc5Unorm
            | TextureFormat::Bc5Snorm
            | TextureFormat::Bc6hUfloat
            | TextureFormat::Bc6hSfloat
            | TextureFormat::Bc7Unorm => 16,
        }
    }

    /// Byte size of one layer of a mip level, `None` on overflow.
    #[must_use]
    pub fn data_size(self, width: u32, height: u32, depth: u32) -> Option<usize> {
        let (units_x, units_y) = if self.is_compressed() {
            (width.div_ceil(4) as usize, height.div_ceil(4) as usize)
        } else {
            (width as usize, height as usize)
        };
        units_x
            .checked_mul(units_y)?
            .checked_mul(depth as usize)?
            .checked_mul(self.unit_size())
    }
}

/// A texture asset: header fields plus raw mip data.
///
/// Mips are indexed largest-first (`mips[0]` is the full resolution level);
/// each level stores every array layer back to back. Loaded iff any mip
/// carries data.
#[derive(Debug, Clone, Default)]
pub struct Texture {
    kind: TextureKind,
    format: TextureFormat,
    mip_level_count: u32,
    array_layer_count: u32,
    width: u32,
    height: u32,
    depth: u32,
    mips: Vec<Vec<u8>>,
}

impl Resource for Texture {
    fn is_loaded(&self) -> bool {
        !self.mips.is_empty()
    }
}

impl Texture {
    /// Builds a texture from parsed parts.
    #[must_use]
    pub fn new(
        kind: TextureKind,
        format: TextureFormat,
        mip_level_count: u32,
        array_layer_count: u32,
        width: u32,
        height: u32,
        depth: u32,
        mips: Vec<Vec<u8>>,
    ) -> Self {
        Self {
            kind,
            format,
            mip_level_count,
            array_layer_count,
            width,
            height,
            depth,
            mips,
        }
    }

    /// Texture dimensionality.
    #[must_use]
    pub fn kind(&self) -> TextureKind {
        self.kind
    }

    /// Pixel format.
    #[must_use]
    pub fn format(&self) -> TextureFormat {
        self.format
    }

    /// Number of mip levels.
    #[must_use]
    pub fn mip_level_count(&self) -> u32 {
        self.mip_level_count
    }

    /// Number of array layers (logical layers times cube faces).
    #[must_use]
    pub fn array_layer_count(&self) -> u32 {
        self.array_layer_count
    }

    /// Top-level width.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Top-level height.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Top-level depth.
    #[must_use]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Raw data of one mip level (all layers), largest level first.
    #[must_use]
    pub fn mip_data(&self, level: u32) -> &[u8] {
        &self.mips[level as usize]
    }
}
