//! WebSocket Real-Time Updates
//!
//! Pushes poller changes to open dashboard pages so they can reload the
//! chart without waiting for their own timer.
//!
//! ## Architecture
//!
//! - **ConnectionHub**: Manages all active connections and subscriptions
//! - **Handler**: Handles WebSocket upgrade and message processing
//! - **Publisher**: Watches the poller and broadcasts its changes
//! - **Messages**: Defines client and server message formats
//!
//! ## Topics
//!
//! - `series` - the charted series changed (`series_updated`)
//! - `status` - a fetch failed (`poll_failed`)
//!
//! ## Example
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:8090/ws');
//!
//! ws.onopen = () => {
//!   ws.send(JSON.stringify({type: 'subscribe', topics: ['series', 'status']}));
//! };
//!
//! ws.onmessage = (event) => {
//!   const msg = JSON.parse(event.data);
//!   if (msg.type === 'series_updated') reloadChart();
//! };
//! ```

mod handler;
mod hub;
mod messages;
mod publisher;

pub use handler::websocket_handler;
pub use hub::{ConnectionHub, HubConfig, HubError};
pub use messages::{ClientMessage, ServerMessage, WsEvent, TOPIC_SERIES, TOPIC_STATUS};
pub use publisher::spawn_publisher;
