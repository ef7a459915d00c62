//! offerdash: an offer-tracking dashboard for paid-traffic marketers.
//!
//! Offers (advertising campaigns with cost, revenue and a scale status) live
//! in an [`offers::store::OfferStore`]. On top of the store sit the Kanban
//! board, CSV exchange, the analytics engine, the landing-page spy tool and
//! the AI mentor chat. The [`web`] module serves all of it as a local
//! dashboard; [`cli`] exposes the same operations on the command line.

pub mod activity;
pub mod analytics;
pub mod chat;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod offers;
pub mod spy;
pub mod web;
