//! JavaScript surface of the bot.

use gloo_timers::future::TimeoutFuture;
use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::js_sys::Promise;

use crate::ai::AiConfig;
use crate::bot::{Bot, BotError, DotsBot};
use crate::game::GameSnapshot;
use crate::trace::{ConsoleSink, Tracer};

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    set_panic_hook();
}

fn to_js_error<E: Serialize + std::fmt::Display>(error: E) -> JsValue {
    to_value(&error).unwrap_or_else(|_| JsValue::from_str(&error.to_string()))
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn console_bot(config: AiConfig) -> DotsBot {
    let tracer = Tracer::new(config.trace, ConsoleSink);
    DotsBot::with_tracer(config, tracer)
}

fn decide_json(config: AiConfig, state_json: &str) -> Result<String, JsValue> {
    let snapshot: GameSnapshot = serde_json::from_str(state_json).map_err(serde_to_js_error)?;
    let decided = console_bot(config)
        .decide(&snapshot)
        .map_err(to_js_error)?;
    serde_json::to_string(&decided).map_err(serde_to_js_error)
}

#[wasm_bindgen]
pub struct BotEngine {
    bot: DotsBot,
}

#[wasm_bindgen]
impl BotEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<BotEngine, JsValue> {
        let config = match config_json {
            Some(json) => AiConfig::from_json(&json).map_err(serde_to_js_error)?,
            None => AiConfig::default(),
        };
        Ok(BotEngine {
            bot: console_bot(config),
        })
    }

    #[wasm_bindgen(js_name = "configJson")]
    pub fn config_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.bot.config()).map_err(serde_to_js_error)
    }

    /// `GameAction` JSON for the snapshot.
    #[wasm_bindgen(js_name = "getActionJson")]
    pub fn get_action_json(&mut self, state_json: &str) -> Result<String, JsValue> {
        let snapshot: GameSnapshot = serde_json::from_str(state_json).map_err(serde_to_js_error)?;
        let action = self.bot.get_action(&snapshot).map_err(to_js_error)?;
        serde_json::to_string(&action).map_err(serde_to_js_error)
    }

    /// Resolves to the full decision JSON after an optional delay.
    pub fn think(&self, state_json: String, delay_ms: Option<u32>) -> Promise {
        let config = self.bot.config().clone();
        let delay = delay_ms.unwrap_or(0);

        future_to_promise(async move {
            if delay > 0 {
                TimeoutFuture::new(delay).await;
            }
            let json = decide_json(config, &state_json)?;
            Ok(JsValue::from_str(&json))
        })
    }
}

#[wasm_bindgen(js_name = "computeAction")]
pub fn compute_action(
    state: JsValue,
    difficulty: Option<String>,
    strategy: Option<String>,
) -> Result<JsValue, JsValue> {
    let snapshot: GameSnapshot = from_value(state).map_err(JsValue::from)?;
    let config = AiConfig::from_names(difficulty.as_deref(), strategy.as_deref());
    let decided = console_bot(config)
        .decide(&snapshot)
        .map_err(to_js_error)?;
    to_value(&decided).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "validateState")]
pub fn validate_state(state: JsValue) -> Result<(), JsValue> {
    let snapshot: GameSnapshot = from_value(state).map_err(JsValue::from)?;
    snapshot
        .integrity_check()
        .map_err(|error| to_js_error(BotError::InvalidSnapshot { error }))
}

#[wasm_bindgen(js_name = "emptyState")]
pub fn empty_state(size: Option<usize>) -> Result<JsValue, JsValue> {
    let snapshot = GameSnapshot::empty(size.unwrap_or(crate::game::DEFAULT_BOARD_SIZE));
    snapshot.integrity_check().map_err(to_js_error)?;
    to_value(&snapshot).map_err(JsValue::from)
}

#[cfg(feature = "console_error_panic_hook")]
fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

#[cfg(not(feature = "console_error_panic_hook"))]
fn set_panic_hook() {}
