use tracing::debug;

use crate::form::FormState;
use crate::form::fields::CREDENTIAL_FIELDS;

/// Encoded size above which photos and ID proofs are re-encoded.
pub const IMAGE_SIZE_LIMIT: usize = 500_000;
/// Encoded size above which the signature is re-encoded.
pub const SIGNATURE_SIZE_LIMIT: usize = 100_000;

/// Target for re-encoding oversized images.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecodeLimits {
    pub max_width: u32,
    pub max_height: u32,
    /// JPEG quality in `0.0..=1.0`.
    pub quality: f32,
}

impl Default for RecodeLimits {
    fn default() -> Self {
        Self {
            max_width: 400,
            max_height: 400,
            quality: 0.7,
        }
    }
}

impl RecodeLimits {
    /// Scale `(width, height)` down to fit, keeping the aspect ratio.
    pub fn fit(&self, width: u32, height: u32) -> (u32, u32) {
        let scale = |num: u32, max: u32, den: u32| ((u64::from(num) * u64::from(max)) / u64::from(den).max(1)) as u32;
        if width > height {
            if width > self.max_width {
                return (self.max_width, scale(height, self.max_width, width));
            }
        } else if height > self.max_height {
            return (scale(width, self.max_height, height), self.max_height);
        }
        (width, height)
    }
}

/// Re-encodes an image data URL into a smaller one.
pub trait ImageRecoder: Send + Sync {
    /// Returns `None` when the image is kept as is.
    fn recode(&self, data_url: &str, limits: &RecodeLimits) -> Option<String>;
}

/// Keeps every image unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRecoder;

impl ImageRecoder for NoopRecoder {
    fn recode(&self, _data_url: &str, _limits: &RecodeLimits) -> Option<String> {
        None
    }
}

fn shrink(slot: &mut String, limit: usize, recoder: &dyn ImageRecoder, limits: &RecodeLimits) {
    if slot.len() <= limit {
        return;
    }
    match recoder.recode(slot, limits) {
        Some(smaller) => {
            debug!("re-encoded image from {} to {} bytes", slot.len(), smaller.len());
            *slot = smaller;
        }
        None => debug!("image of {} bytes kept unchanged", slot.len()),
    }
}

/// Copy of `state` fit for storage: credential-like fields removed and
/// oversized attachments handed to `recoder`.
pub fn sanitize(state: &FormState, recoder: &dyn ImageRecoder) -> FormState {
    let limits = RecodeLimits::default();
    let mut clean = state.clone();

    for field in CREDENTIAL_FIELDS {
        clean.remove_value(field);
    }

    if let Some(mut photo) = clean.photo().map(str::to_string) {
        shrink(&mut photo, IMAGE_SIZE_LIMIT, recoder, &limits);
        clean.set_photo(Some(photo));
    }
    if let Some(mut signature) = clean.signature().map(str::to_string) {
        shrink(&mut signature, SIGNATURE_SIZE_LIMIT, recoder, &limits);
        clean.set_signature(Some(signature));
    }
    for proof in clean.id_proofs_mut() {
        shrink(proof, IMAGE_SIZE_LIMIT, recoder, &limits);
    }
    clean
}
