//! Manual payment collection.
//!
//! The store has no payment gateway. Shoppers either pay cash on delivery
//! or pay by UPI from their own app using a link with the amount locked in,
//! then upload a screenshot that an admin checks before confirming.

pub mod screenshot;
pub mod upi;

pub use screenshot::{MAX_SCREENSHOT_BYTES, PaymentScreenshot, UploadError};
pub use upi::{
    DeviceKind, InvalidPaymentRequest, MobileOs, OrderReference, PaymentChannel, UpiApp, UpiError,
    UpiLinks, qr_svg,
};
