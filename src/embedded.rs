//! Archive image compiled into the binary, served as `$Embedded`.
//!
//! Without the `embedded-resources` feature this is a placeholder that
//! [`MemoryStream::open_embedded`](crate::io::MemoryStream::open_embedded)
//! refuses. With the feature, the ZIP named by `RESPACK_EMBEDDED_ZIP` at
//! build time is baked in.

#[cfg(not(feature = "embedded-resources"))]
static PLACEHOLDER: [u8; 128] = {
    let mut data = [0u8; 128];
    data[0] = b'P';
    data[1] = b'K';
    data[2] = 0x03;
    data[3] = 0x04;
    let mut i = 5;
    while i < 47 {
        data[i] = 0x42;
        i += 1;
    }
    data
};

#[cfg(not(feature = "embedded-resources"))]
pub static EMBEDDED_RESOURCES: &[u8] = &PLACEHOLDER;

#[cfg(feature = "embedded-resources")]
pub static EMBEDDED_RESOURCES: &[u8] = include_bytes!(env!("RESPACK_EMBEDDED_ZIP"));
