//! Extension traits for plugging [`BitRequests`] into a reqwest client.

use reqwest::{Client, ClientBuilder};
use reqwest_middleware as rqm;

use crate::client::BitRequests;

/// Wraps a [`Client`] or [`ClientBuilder`] so that it pays 402 challenges.
pub trait ReqwestWithPayments<A> {
    fn with_payments(self, bit_requests: BitRequests) -> ReqwestWithPaymentsBuilder<A>;
}

impl ReqwestWithPayments<Client> for Client {
    fn with_payments(self, bit_requests: BitRequests) -> ReqwestWithPaymentsBuilder<Client> {
        ReqwestWithPaymentsBuilder {
            inner: self,
            bit_requests,
        }
    }
}

impl ReqwestWithPayments<ClientBuilder> for ClientBuilder {
    fn with_payments(self, bit_requests: BitRequests) -> ReqwestWithPaymentsBuilder<ClientBuilder> {
        ReqwestWithPaymentsBuilder {
            inner: self,
            bit_requests,
        }
    }
}

pub struct ReqwestWithPaymentsBuilder<A> {
    inner: A,
    bit_requests: BitRequests,
}

pub trait ReqwestWithPaymentsBuild {
    type BuildResult;
    type BuilderResult;

    /// Builds the middleware-wrapped client.
    fn build(self) -> Self::BuildResult;
    /// Returns the middleware builder, for stacking more middleware.
    fn builder(self) -> Self::BuilderResult;
}

impl ReqwestWithPaymentsBuild for ReqwestWithPaymentsBuilder<Client> {
    type BuildResult = rqm::ClientWithMiddleware;
    type BuilderResult = rqm::ClientBuilder;

    fn build(self) -> Self::BuildResult {
        self.builder().build()
    }

    fn builder(self) -> Self::BuilderResult {
        rqm::ClientBuilder::new(self.inner).with(self.bit_requests)
    }
}

impl ReqwestWithPaymentsBuild for ReqwestWithPaymentsBuilder<ClientBuilder> {
    type BuildResult = Result<rqm::ClientWithMiddleware, reqwest::Error>;
    type BuilderResult = Result<rqm::ClientBuilder, reqwest::Error>;

    fn build(self) -> Self::BuildResult {
        let builder = self.builder()?;
        Ok(builder.build())
    }

    fn builder(self) -> Self::BuilderResult {
        let client = self.inner.build()?;
        Ok(rqm::ClientBuilder::new(client).with(self.bit_requests))
    }
}
