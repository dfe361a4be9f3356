//! File-kind identification from leading bytes.

/// How many decompressed bytes identification looks at.
pub const SNIFF_LEN: u64 = 32;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FileKind {
    Animation,
    Jpeg,
    LuaObj,
    MapGeometry,
    Png,
    Preload,
    PropertyBin,
    PropertyBinOverride,
    RiotStringTable,
    SimpleSkin,
    Skeleton,
    StaticMeshAscii,
    StaticMeshBinary,
    Texture,
    TextureDds,
    WorldGeometry,
    WwiseBank,
    WwisePackage,
    Unknown,
}

const SKELETON_FORMAT_TOKEN: u32 = 0x22FD_4FC3;
const SIMPLE_SKIN_MAGIC: u32 = 0x0011_2233;

fn u32_at(data: &[u8], off: usize) -> Option<u32> {
    let b = data.get(off..off + 4)?;
    Some(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

impl FileKind {
    pub fn identify(data: &[u8]) -> Self {
        if data.starts_with(b"r3d2Mesh") {
            Self::StaticMeshBinary
        } else if data.starts_with(b"r3d2sklt") || u32_at(data, 4) == Some(SKELETON_FORMAT_TOKEN) {
            Self::Skeleton
        } else if data.starts_with(b"r3d2anmd") || data.starts_with(b"r3d2canm") {
            Self::Animation
        } else if data.starts_with(b"r3d2") && u32_at(data, 4) == Some(1) {
            Self::WwisePackage
        } else if data.starts_with(b"[ObjectBegin]") {
            Self::StaticMeshAscii
        } else if data.starts_with(b"PROP") {
            Self::PropertyBin
        } else if data.starts_with(b"PTCH") {
            Self::PropertyBinOverride
        } else if data.starts_with(b"DDS ") {
            Self::TextureDds
        } else if data.starts_with(b"TEX\0") {
            Self::Texture
        } else if data.starts_with(&[0x89, b'P', b'N', b'G']) {
            Self::Png
        } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Self::Jpeg
        } else if data.starts_with(b"BKHD") {
            Self::WwiseBank
        } else if data.starts_with(b"OEGM") {
            Self::MapGeometry
        } else if data.starts_with(b"WGEO") {
            Self::WorldGeometry
        } else if data.starts_with(b"RST") {
            Self::RiotStringTable
        } else if data.starts_with(b"PreLoad") {
            Self::Preload
        } else if data.starts_with(&[0x1B, b'L', b'u', b'a']) {
            Self::LuaObj
        } else if u32_at(data, 0) == Some(SIMPLE_SKIN_MAGIC) {
            Self::SimpleSkin
        } else {
            Self::Unknown
        }
    }

    /// Extension without the leading dot; `None` for [`FileKind::Unknown`].
    pub fn extension(self) -> Option<&'static str> {
        Some(match self {
            Self::Animation => "anm",
            Self::Jpeg => "jpg",
            Self::LuaObj => "luaobj",
            Self::MapGeometry => "mapgeo",
            Self::Png => "png",
            Self::Preload => "preload",
            Self::PropertyBin | Self::PropertyBinOverride => "bin",
            Self::RiotStringTable => "stringtable",
            Self::SimpleSkin => "skn",
            Self::Skeleton => "skl",
            Self::StaticMeshAscii => "sco",
            Self::StaticMeshBinary => "scb",
            Self::Texture => "tex",
            Self::TextureDds => "dds",
            Self::WorldGeometry => "wgeo",
            Self::WwiseBank => "bnk",
            Self::WwisePackage => "wpk",
            Self::Unknown => return None,
        })
    }

    pub fn from_extension(extension: &str) -> Self {
        match extension.trim_start_matches('.') {
            "anm" => Self::Animation,
            "bin" => Self::PropertyBin,
            "bnk" => Self::WwiseBank,
            "dds" => Self::TextureDds,
            "jpg" | "jpeg" => Self::Jpeg,
            "luaobj" => Self::LuaObj,
            "mapgeo" => Self::MapGeometry,
            "png" => Self::Png,
            "preload" => Self::Preload,
            "scb" => Self::StaticMeshBinary,
            "sco" => Self::StaticMeshAscii,
            "skl" => Self::Skeleton,
            "skn" => Self::SimpleSkin,
            "stringtable" => Self::RiotStringTable,
            "tex" => Self::Texture,
            "wgeo" => Self::WorldGeometry,
            "wpk" => Self::WwisePackage,
            _ => Self::Unknown,
        }
    }
}
