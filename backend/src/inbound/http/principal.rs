//! Principals injected by the authorisation middleware.
//!
//! The middleware stores the resolved identifier in the request extensions;
//! handlers pull it out with these extractors. A missing principal means the
//! route was mounted without its middleware, which is a server fault.

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpMessage, HttpRequest};
use futures_util::future::{Ready, ready};
use uuid::Uuid;

use crate::domain::Error;

macro_rules! principal {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Identifier of the authorised row.
            pub fn id(self) -> Uuid {
                self.0
            }
        }

        impl FromRequest for $name {
            type Error = Error;
            type Future = Ready<Result<Self, Self::Error>>;

            fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
                ready(req.extensions().get::<$name>().copied().ok_or_else(|| {
                    Error::internal(concat!(stringify!($name), " not found in request context"))
                }))
            }
        }
    };
}

principal! {
    /// App resolved from an API token or single sign-on.
    AuthorizedAppId
}

principal! {
    /// Contact resolved from a confirmation token.
    AuthorizedAppContactId
}
