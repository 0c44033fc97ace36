//! Static route classification.
//!
//! Matching is plain string-prefix matching against the request path, checked
//! in the order Public → Privileged → General. The first table that matches
//! wins, so a privileged path is never treated as public even when prefixes
//! happen to overlap.

/// Landing route for privileged staff.
pub const PRIVILEGED_HOME: &str = "/";

/// Landing route for every other authenticated user.
pub const ORDINARY_HOME: &str = "/users/home";

/// Where unauthenticated users are sent.
pub const SIGN_IN_ROUTE: &str = "/sign-in";

/// Query parameter carrying the originally requested path to the sign-in page.
pub const CALLBACK_PARAM: &str = "callbackUrl";

/// Routes restricted to the privileged role.
pub const PRIVILEGED_ROUTES: &[&str] = &[
    "/dashboard",
    "/inventory",
    "/inventory/medicines",
    "/illness",
    "/illnessCategory",
    "/history",
    "/leaves",
    "/feeds",
    "/treatment",
];

/// Protected routes open to any authenticated user, in addition to the
/// privileged set.
pub const GENERAL_ROUTES: &[&str] = &["/users/home", "/users/profile"];

/// Routes reachable without a credential.
pub const PUBLIC_ROUTES: &[&str] = &[
    "/sign-in",
    "/sign-up",
    "/confirm-account",
    "/forgot-password",
    "/reset-password",
    "/verify-mfa",
];

/// Path prefixes (after the leading slash) the gate is never applied to:
/// API routes, framework static assets and the favicon.
pub const UNGATED_PREFIXES: &[&str] = &["api", "_next/static", "_next/image", "favicon.ico"];

/// RouteClass
///
/// The three disjoint categories every path falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Public,
    Privileged,
    General,
}

impl RouteClass {
    pub fn is_protected(self) -> bool {
        !matches!(self, RouteClass::Public)
    }
}

/// Every protected prefix: the privileged set plus the general-authenticated
/// routes.
pub fn protected_routes() -> impl Iterator<Item = &'static str> {
    PRIVILEGED_ROUTES.iter().chain(GENERAL_ROUTES).copied()
}

pub fn classify(path: &str) -> RouteClass {
    if matches_any(path, PUBLIC_ROUTES) {
        RouteClass::Public
    } else if matches_any(path, PRIVILEGED_ROUTES) {
        RouteClass::Privileged
    } else {
        RouteClass::General
    }
}

/// Whether the gate runs for this path at all.
pub fn is_gated(path: &str) -> bool {
    let rest = path.strip_prefix('/').unwrap_or(path);
    !UNGATED_PREFIXES
        .iter()
        .any(|prefix| rest.starts_with(prefix))
}

fn matches_any(path: &str, prefixes: &[&str]) -> bool {
    prefixes.iter().any(|prefix| path.starts_with(prefix))
}

/// Canonical form of a request path: percent-encoded unreserved characters
/// decoded, repeated slashes collapsed, `.` and `..` segments resolved (never
/// above the root). A trailing slash is kept.
///
/// The route tables are only meaningful against this form; the renderer
/// behind the gateway applies the same normalization.
pub fn canonical_path(path: &str) -> String {
    let decoded = decode_unreserved(path);

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    let mut canonical = format!("/{}", segments.join("/"));
    let trailing =
        decoded.ends_with('/') || decoded.ends_with("/.") || decoded.ends_with("/..");
    if trailing && !segments.is_empty() {
        canonical.push('/');
    }
    canonical
}

/// Whether the path smuggles a separator in encoded form (`%2F`, `%5C`) or
/// uses a backslash. Such paths cannot be classified reliably.
pub fn has_ambiguous_separator(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    lower.contains("%2f") || lower.contains("%5c") || path.contains('\\')
}

// RFC 3986 unreserved set.
fn is_unreserved(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~')
}

fn decode_unreserved(path: &str) -> String {
    let bytes = path.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let decoded = path
                .get(i + 1..i + 3)
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .filter(|byte| is_unreserved(*byte));
            if let Some(byte) = decoded {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    // Only ASCII triples were replaced by ASCII bytes, so this stays valid UTF-8.
    String::from_utf8(out).unwrap_or_else(|_| path.to_string())
}
