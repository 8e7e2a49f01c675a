//! Hold request consumer core: record model, stream/backend schemas, routing and code tables.

pub mod codec;
pub mod codes;
pub mod messages;
pub mod routing;
pub mod types;

pub use codec::{decode_payload, encode_payload, CodecError};
pub use codes::{owning_institution, DeliveryLocationTable, REQUESTING_INSTITUTION};
pub use messages::{OffsiteRequest, OffsiteResponse, OnsiteRequest, OutcomeError, OutcomeRecord};
pub use routing::Route;
pub use types::{
    BackendResponse, DocDeliveryData, HoldRequestId, HoldRequestRecord, Item, ItemLocation,
    Patron, RequestType,
};
