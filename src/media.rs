// src/media.rs

/// Media type resolved from a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaType {
    pub mime: &'static str,
    pub binary: bool,
}

// Substring match over the path, first entry wins.
const TABLE: &[(&str, MediaType)] = &[
    (".html", MediaType { mime: "text/html", binary: false }),
    (".css", MediaType { mime: "text/css", binary: false }),
    (".js", MediaType { mime: "text/javascript", binary: false }),
    (".png", MediaType { mime: "image/png", binary: true }),
    (".gif", MediaType { mime: "image/gif", binary: true }),
    (".jpg", MediaType { mime: "image/jpeg", binary: true }),
    (".svg", MediaType { mime: "image/svg+xml", binary: true }),
    (".eot", MediaType { mime: "application/vnd.ms-fontobject", binary: true }),
    (".ttf", MediaType { mime: "font/ttf", binary: true }),
    (".woff", MediaType { mime: "font/woff", binary: true }),
    (".woff2", MediaType { mime: "font/woff2", binary: true }),
];

const DEFAULT: MediaType = MediaType { mime: "text/plain", binary: false };

pub fn lookup(path: &str) -> MediaType {
    for (ext, media) in TABLE {
        if path.contains(ext) {
            return *media;
        }
    }
    DEFAULT
}
