//! Request context consulted by request-dependent defaults

use url::Url;

use crate::prelude::*;

/// Origin of the request currently being served
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestInfo {
	pub scheme: Box<str>,
	pub host: Box<str>,
	pub port: u16,
}

impl RequestInfo {
	/// `scheme://host[:port]`, leaving out port 80
	pub fn base_url(&self) -> String {
		if self.port == 80 {
			format!("{}://{}", self.scheme, self.host)
		} else {
			format!("{}://{}:{}", self.scheme, self.host, self.port)
		}
	}

	/// Parse an origin such as `https://example.com:8443`
	pub fn parse(origin: &str) -> ClResult<Self> {
		let invalid = || Error::ConfigError(format!("Invalid public URL: {}", origin));

		let url = Url::parse(origin).map_err(|_| invalid())?;
		if !matches!(url.scheme(), "http" | "https") {
			return Err(invalid());
		}
		let host = url.host_str().filter(|host| !host.is_empty()).ok_or_else(invalid)?;
		let port = url.port_or_known_default().ok_or_else(invalid)?;

		Ok(Self { scheme: url.scheme().into(), host: host.into(), port })
	}
}

pub trait RequestContext: Send + Sync {
	fn current_request(&self) -> Option<RequestInfo>;
}

/// No request is ever being served (startup, command line tools)
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRequestContext;

impl RequestContext for NoRequestContext {
	fn current_request(&self) -> Option<RequestInfo> {
		None
	}
}

/// A configured public origin standing in for the live request
#[derive(Debug, Clone)]
pub struct FixedRequestContext(pub RequestInfo);

impl RequestContext for FixedRequestContext {
	fn current_request(&self) -> Option<RequestInfo> {
		Some(self.0.clone())
	}
}


// vim: ts=4
