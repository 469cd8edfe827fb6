//! Content-type detection for files on disk.
//!
//! Order of evidence: magic numbers in the first `SNIFF_LEN` bytes, then the
//! file extension, then a text/binary heuristic over the same bytes.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

pub const SNIFF_LEN: usize = 8 * 1024;
pub const TEXT_PLAIN: &str = "text/plain";
pub const OCTET_STREAM: &str = "application/octet-stream";

const ZIP: &str = "application/zip";
const OLE_STORAGE: &str = "application/x-ole-storage";

/// Read the head of `path` and classify it.
pub fn detect_content_type(path: &Path) -> io::Result<String> {
    let mut head = Vec::with_capacity(SNIFF_LEN);
    File::open(path)?
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut head)?;
    Ok(classify(path, &head).to_string())
}

/// Classify a file from its name and leading bytes.
pub fn classify(path: &Path, head: &[u8]) -> &'static str {
    if head.is_empty() {
        return TEXT_PLAIN;
    }
    if let Some(sniffed) = sniff_bytes(head) {
        // Office documents share container formats; the extension picks the flavour.
        return match (sniffed, type_for_extension(path)) {
            (ZIP | OLE_STORAGE, Some(by_ext)) if by_ext.starts_with("application/vnd.") => by_ext,
            (ZIP | OLE_STORAGE, Some(by_ext)) if by_ext == "application/msword" => by_ext,
            (OLE_STORAGE, _) => OCTET_STREAM,
            (sniffed, _) => sniffed,
        };
    }
    if let Some(by_ext) = type_for_extension(path) {
        return by_ext;
    }
    if content_inspector::inspect(head).is_binary() {
        OCTET_STREAM
    } else {
        TEXT_PLAIN
    }
}

/// Recognize well-known binary signatures.
pub fn sniff_bytes(head: &[u8]) -> Option<&'static str> {
    const SIGNATURES: &[(&[u8], &str)] = &[
        (b"\x89PNG\r\n\x1a\n", "image/png"),
        (b"\xFF\xD8\xFF", "image/jpeg"),
        (b"GIF87a", "image/gif"),
        (b"GIF89a", "image/gif"),
        (b"%PDF-", "application/pdf"),
        (b"PK\x03\x04", ZIP),
        (b"PK\x05\x06", ZIP),
        (b"\x1F\x8B", "application/gzip"),
        (b"7z\xBC\xAF\x27\x1C", "application/x-7z-compressed"),
        (b"Rar!\x1A\x07", "application/x-rar"),
        (b"OggS", "audio/ogg"),
        (b"fLaC", "audio/flac"),
        (b"ID3", "audio/mpeg"),
        (b"\xD0\xCF\x11\xE0\xA1\xB1\x1A\xE1", OLE_STORAGE),
    ];
    if let Some(&(_, ct)) = SIGNATURES.iter().find(|(magic, _)| head.starts_with(magic)) {
        return Some(ct);
    }
    if head.len() >= 12 && head.starts_with(b"RIFF") {
        match &head[8..12] {
            b"WEBP" => return Some("image/webp"),
            b"WAVE" => return Some("audio/x-wav"),
            b"AVI " => return Some("video/x-msvideo"),
            _ => {}
        }
    }
    // "BM", file size, then four reserved zero bytes.
    if head.len() >= 14 && head.starts_with(b"BM") && head[6..10] == [0, 0, 0, 0] {
        return Some("image/bmp");
    }
    if head.len() >= 12 && &head[4..8] == b"ftyp" {
        return Some("video/mp4");
    }
    if head.len() >= 262 && &head[257..262] == b"ustar" {
        return Some("application/x-tar");
    }
    None
}

/// Map a file extension to a content type.
pub fn type_for_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let ct = match ext.as_str() {
        "txt" | "text" | "log" => TEXT_PLAIN,
        "md" | "markdown" => "text/markdown",
        "rs" => "text/rust",
        "c" => "text/x-csrc",
        "h" => "text/x-chdr",
        "cc" | "cpp" | "cxx" => "text/x-c++src",
        "hh" | "hpp" | "hxx" => "text/x-c++hdr",
        "py" => "text/x-python",
        "js" => "text/javascript",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "csv" => "text/csv",
        "sh" => "application/x-shellscript",
        "json" => "application/json",
        "toml" => "application/toml",
        "xml" => "application/xml",
        "yaml" | "yml" => "application/yaml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "ico" => "image/vnd.microsoft.icon",
        "svg" => "image/svg+xml",
        "mp4" | "m4v" => "video/mp4",
        "mkv" => "video/x-matroska",
        "webm" => "video/webm",
        "avi" => "video/x-msvideo",
        "mov" => "video/quicktime",
        "mp3" => "audio/mpeg",
        "wav" => "audio/x-wav",
        "flac" => "audio/flac",
        "ogg" | "oga" => "audio/ogg",
        "pdf" => "application/pdf",
        "zip" => ZIP,
        "tar" => "application/x-tar",
        "gz" | "tgz" => "application/gzip",
        "rar" => "application/x-rar",
        "7z" => "application/x-7z-compressed",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "bin" => OCTET_STREAM,
        _ => return None,
    };
    Some(ct)
}
