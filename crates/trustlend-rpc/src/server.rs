//! Request routing and method handlers.
//!
//! Every method takes a params object naming the acting user explicitly;
//! the host process is responsible for having authenticated that user.

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};

use trustlend::{BookingId, Decision, ItemId, Marketplace, Profile, UserId};

use crate::protocol::{
    error_response, ok_result, parse_params, rpc_error, RpcError, INVALID_REQUEST,
};

/// Methods served, in the order `rpc.methods` reports them.
pub const METHODS: &[&str] = &[
    "ping",
    "rpc.methods",
    "profile.register",
    "profile.get",
    "profile.search",
    "trust.add",
    "trust.revoke",
    "trust.outgoing",
    "trust.followers",
    "trust.level",
    "trust.path",
    "item.publish",
    "item.list_mine",
    "item.visible",
    "item.blocked_dates",
    "booking.request",
    "booking.decide",
    "booking.list_mine",
    "booking.incoming",
    "booking.quote",
];

// ── Params ────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct UserParams {
    user: UserId,
}

#[derive(Deserialize)]
struct RegisterProfileParams {
    user: UserId,
    display_name: String,
    #[serde(default)]
    contact: String,
}

#[derive(Deserialize)]
struct SearchParams {
    query: String,
    #[serde(default)]
    exclude: Option<UserId>,
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Deserialize)]
struct EdgeParams {
    follower: UserId,
    following: UserId,
    #[serde(default = "default_strength")]
    strength: u32,
}

fn default_strength() -> u32 {
    1
}

#[derive(Deserialize)]
struct PairParams {
    viewer: UserId,
    target: UserId,
}

#[derive(Deserialize)]
struct PublishParams {
    owner: UserId,
    title: String,
    lat: f64,
    lng: f64,
    price_per_day: f64,
}

#[derive(Deserialize)]
struct VisibleParams {
    viewer: UserId,
    #[serde(default)]
    ranked: bool,
}

#[derive(Deserialize)]
struct ItemParams {
    item_id: ItemId,
}

#[derive(Deserialize)]
struct RequestParams {
    item_id: ItemId,
    borrower: UserId,
    start_date: NaiveDate,
    end_date: NaiveDate,
}

#[derive(Deserialize)]
struct DecideParams {
    booking_id: BookingId,
    actor: UserId,
    decision: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum QuoteParams {
    Booking {
        booking_id: BookingId,
    },
    Range {
        price_per_day: f64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    },
}

// ── Server ────────────────────────────────────────────────────────────────────

pub struct RpcServer {
    market: Marketplace,
}

impl RpcServer {
    pub fn new(market: Marketplace) -> Self {
        Self { market }
    }

    /// Route one JSON-RPC request. Returns `Value::Null` for notifications.
    pub fn handle_request(&self, request: Value) -> Value {
        let id = request.get("id").cloned().unwrap_or(Value::Null);
        let is_notification = request.get("id").is_none();
        let method = match request.get("method").and_then(|m| m.as_str()) {
            Some(m) => m.to_string(),
            None => return rpc_error(id, INVALID_REQUEST, "missing method"),
        };
        let params = request
            .get("params")
            .cloned()
            .unwrap_or(Value::Object(Default::default()));

        let span = tracing::debug_span!("request", method = %method);
        let _enter = span.enter();

        let outcome = self.dispatch(&method, params);
        if is_notification {
            return Value::Null;
        }
        match outcome {
            Ok(result) => ok_result(id, result),
            Err(err) => {
                tracing::warn!(code = err.code(), "{method} failed: {err}");
                error_response(id, &err)
            }
        }
    }

    fn dispatch(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let m = &self.market;
        let result = match method {
            "ping" => json!({}),
            "rpc.methods" => json!(METHODS),

            "profile.register" => {
                let p: RegisterProfileParams = parse_params(params)?;
                let profile = Profile::new(p.user, p.display_name, p.contact);
                m.register_profile(profile.clone())?;
                serde_json::to_value(profile)?
            }
            "profile.get" => {
                let p: UserParams = parse_params(params)?;
                serde_json::to_value(m.profile(&p.user)?)?
            }
            "profile.search" => {
                let p: SearchParams = parse_params(params)?;
                serde_json::to_value(m.search_profiles(&p.query, p.exclude.as_ref(), p.limit)?)?
            }

            "trust.add" => {
                let p: EdgeParams = parse_params(params)?;
                let edge = m.add_trust_edge(&p.follower, &p.following, p.strength)?;
                json!({ "edge_id": edge.id, "edge": edge })
            }
            "trust.revoke" => {
                let p: EdgeParams = parse_params(params)?;
                json!({ "revoked": m.revoke_trust_edge(&p.follower, &p.following)? })
            }
            "trust.outgoing" => {
                let p: UserParams = parse_params(params)?;
                serde_json::to_value(m.list_outgoing_trust(&p.user))?
            }
            "trust.followers" => {
                let p: UserParams = parse_params(params)?;
                serde_json::to_value(m.list_followers(&p.user))?
            }
            "trust.level" => {
                let p: PairParams = parse_params(params)?;
                let level = m.handshake_level(&p.viewer, &p.target);
                json!({ "level": level.as_u8(), "label": level.as_str() })
            }
            "trust.path" => {
                let p: PairParams = parse_params(params)?;
                serde_json::to_value(m.trust_path(&p.viewer, &p.target))?
            }

            "item.publish" => {
                let p: PublishParams = parse_params(params)?;
                let item = m.publish_item(&p.owner, &p.title, p.lat, p.lng, p.price_per_day)?;
                json!({ "item_id": item.id, "item": item })
            }
            "item.list_mine" => {
                let p: UserParams = parse_params(params)?;
                serde_json::to_value(m.list_my_items(&p.user))?
            }
            "item.visible" => {
                let p: VisibleParams = parse_params(params)?;
                let items = if p.ranked {
                    m.rank_visible_items(&p.viewer)
                } else {
                    m.list_visible_items(&p.viewer)
                };
                serde_json::to_value(items)?
            }
            "item.blocked_dates" => {
                let p: ItemParams = parse_params(params)?;
                serde_json::to_value(m.list_blocked_dates(&p.item_id))?
            }

            "booking.request" => {
                let p: RequestParams = parse_params(params)?;
                let booking = m.request_booking(&p.item_id, &p.borrower, p.start_date, p.end_date)?;
                serde_json::to_value(booking)?
            }
            "booking.decide" => {
                let p: DecideParams = parse_params(params)?;
                let decision: Decision = p.decision.parse()?;
                serde_json::to_value(m.decide_booking(&p.booking_id, &p.actor, decision)?)?
            }
            "booking.list_mine" => {
                let p: UserParams = parse_params(params)?;
                serde_json::to_value(m.list_my_bookings(&p.user))?
            }
            "booking.incoming" => {
                let p: UserParams = parse_params(params)?;
                serde_json::to_value(m.list_incoming_requests(&p.user))?
            }
            "booking.quote" => {
                let total = match parse_params::<QuoteParams>(params)? {
                    QuoteParams::Booking { booking_id } => m.quote_booking(&booking_id)?,
                    QuoteParams::Range {
                        price_per_day,
                        start_date,
                        end_date,
                    } => m.quote(price_per_day, start_date, end_date)?,
                };
                json!({ "total": total })
            }

            other => return Err(RpcError::MethodNotFound(other.to_string())),
        };
        Ok(result)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
