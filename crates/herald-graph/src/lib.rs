//! Herald Graph - publication runs over the store/broker boundaries

pub mod builder;
pub mod lint;
pub mod offer;
pub mod publisher;
pub mod run;

pub use builder::GraphBuilder;
pub use lint::LinkLinter;
pub use offer::{CatalogSpec, ContractDescription, OfferDescription, RepresentationDescription};
pub use publisher::{rewrite_host, BrokerPublisher};
pub use run::{Publication, RunPhase};
