use anyhow::{Context, Result};
use colored::Colorize;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

/// Extensions the Photos library accepts
///
/// Photos: BMP, GIF, HEIC, ICO, JPG, PNG, TIFF, WEBP, some RAW files (up to 200 MB)
/// Videos: 3GP, 3G2, ASF, AVI, DIVX, M2T, M2TS, M4V, MKV, MMV, MOD, MOV, MP4, MPG, MTS, TOD, WMV (up to 10 GB)
pub static MEDIA_EXTENSIONS: &[&str] = &[
    "BMP", "GIF", "HEIC", "ICO", "JPG", "JPEG", "PNG", "TIF", "TIFF", "WEBP", "RAW", "3GP", "3G2",
    "ASF", "AVI", "DIVX", "M2T", "M2TS", "M4V", "MKV", "MMV", "MOD", "MOV", "MP4", "MPG", "MTS",
    "TOD", "WMV",
];

pub static MEDIA_FILE: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(&format!(r"\.({})$", MEDIA_EXTENSIONS.join("|")))
        .case_insensitive(true)
        .build()
        .unwrap()
});

/// Compile a user-provided exclusion pattern, matched case-insensitively anywhere in a path
pub fn compile_exclusion(input: &str) -> Result<Regex> {
    RegexBuilder::new(input)
        .case_insensitive(true)
        .build()
        .with_context(|| format!("Invalid exclusion regex: {}", input.bright_yellow()))
}
