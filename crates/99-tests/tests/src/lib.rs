//! Cross-crate scenarios: a host instance and a worker thread talking over a
//! real channel.

#[cfg(test)]
mod support;

#[cfg(test)]
mod module_contract;

#[cfg(test)]
mod session_e2e;

#[cfg(test)]
mod event_flow;
