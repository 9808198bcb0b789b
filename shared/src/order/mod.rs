//! Order domain - aggregate, state machines, events

pub mod event;
pub mod snapshot;
pub mod status;
pub mod types;

pub use event::{EventPayload, OrderEvent, OrderEventType};
pub use snapshot::Order;
pub use status::{
    ActorRole, OrderStatus, PaymentStatus, allowed_roles, can_transition, payment_can_transition,
};
pub use types::{
    ActorRef, AppliedVoucher, AuditEntry, Cancellation, CustomerInfo, DeliveryAttempt,
    DeliveryFailure, FeeLine, InternalNote, KitchenStatus, ManualDiscount, OptionChoice, OrderItem,
    OrderItemInput, OrderType, PaymentInfo, PaymentMethod, Pricing, Priority, RefundStatus,
    ShipperInfo, SizeChoice, ToppingChoice,
};
