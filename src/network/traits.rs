//! Regressor trait definition

use crate::error::Result;
use crate::features::FeatureDescriptor;

/// A model that turns one descriptor into one affect scalar
///
/// Implemented by [`super::AudioNet`]; the predictor is generic over it so
/// stub models can stand in for trained weights.
pub trait AffectModel: Send + Sync {
    fn predict(&self, descriptor: &FeatureDescriptor) -> Result<f32>;
}

impl<M: AffectModel + ?Sized> AffectModel for Box<M> {
    fn predict(&self, descriptor: &FeatureDescriptor) -> Result<f32> {
        (**self).predict(descriptor)
    }
}
