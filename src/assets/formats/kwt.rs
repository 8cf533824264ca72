use super::reader::BinaryReader;
use crate::errors::{KeelError, Result};
use crate::resources::texture::{Texture, TextureFormat, TextureKind};

const KWT_MAGIC: [u8; 4] = *b"KWT ";

/// Parses a `.kwt` texture file.
///
/// Layout: magic; `u32` type, format, mip count, array layer count
/// (logical layers × cube faces), width, height, depth; then mip levels from
/// smallest to largest, each containing every layer.
pub fn parse_texture(data: &[u8], path: &str) -> Result<Texture> {
    let mut reader = BinaryReader::new(data, path);
    reader.expect_magic(KWT_MAGIC)?;

    let kind = TextureKind::from_file_value(reader.read_u32()?)
        .ok_or_else(|| KeelError::asset(path, "unsupported texture type"))?;
    let format = TextureFormat::from_file_value(reader.read_u32()?)
        .ok_or_else(|| KeelError::asset(path, "unsupported texture format"))?;
    let mip_level_count = reader.read_u32()?;
    let array_layer_count = reader.read_u32()?;
    let width = reader.read_u32()?;
    let height = reader.read_u32()?;
    let depth = reader.read_u32()?;

    if width == 0 || height == 0 || mip_level_count == 0 || array_layer_count == 0 {
        return Err(KeelError::asset(path, "degenerate texture dimensions"));
    }
    if mip_level_count > 32 {
        return Err(KeelError::asset(path, "implausible mip level count"));
    }

    // Mips are stored smallest-first; collect them largest-first the way the
    // texture object exposes them.
    let mut mips: Vec<Vec<u8>> = vec![Vec::new(); mip_level_count as usize];
    for mip in (0..mip_level_count).rev() {
        let mip_width = (width >> mip).max(1);
        let mip_height = (height >> mip).max(1);
        let mip_depth = (depth >> mip).max(1);

        let size = format
            .data_size(mip_width, mip_height, mip_depth)
            .ok_or_else(|| KeelError::asset(path, "mip size overflow"))?
            * array_layer_count as usize;

        mips[mip as usize] = reader.read_bytes(size)?.to_vec();
    }

    Ok(Texture::new(
        kind,
        format,
        mip_level_count,
        array_layer_count,
        width,
        height,
        depth,
        mips,
    ))
}
