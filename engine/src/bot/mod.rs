//! Slack integration
//!
//! `SlackWebApi` answers directory lookups over the Web API and `SlackRtm`
//! carries the real-time event stream.

pub mod slack_api;
pub mod slack_rtm;

pub use slack_api::{AuthInfo, SlackWebApi};
pub use slack_rtm::SlackRtm;
