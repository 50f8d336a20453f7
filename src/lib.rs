//! Carbon footprint prediction service.
//!
//! A JSON request is validated into a [`validation::PredictionRequest`], its
//! categories are encoded, the values are assembled into a
//! [`features::FeatureVector`] and handed to whatever [`model::Regressor`]
//! the [`service::PredictionService`] currently holds.

pub mod api;
pub mod config;
pub mod encoding;
pub mod error;
pub mod features;
pub mod model;
pub mod service;
pub mod validation;
