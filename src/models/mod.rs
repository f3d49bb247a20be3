pub mod booking;
pub mod car;
pub mod user;

pub use booking::{
    Booking, BookingStatus, BookingWithCar, CreateBookingRequest, NewBooking, PaymentStatus,
    UpdateBookingStatusRequest,
};
pub use car::{Car, CarFilter, CarPatch, CarPayload, CarStatus, FuelType, NewCar, Transmission};
pub use user::{Claims, Identity, Role, User};
