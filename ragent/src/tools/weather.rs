//! Weather lookup tool: `get_weather_update(city, date)`.
//!
//! There is no upstream weather service; the reading is drawn at random, which keeps the
//! tool useful for exercising the tool-call loop end to end.

use std::sync::Mutex;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};

use super::schema::parse_date_time;
use super::{Tool, ToolCallContent, ToolCallContext, ToolError, ToolSpec};

/// Tool name for the weather lookup.
pub const TOOL_GET_WEATHER_UPDATE: &str = "get_weather_update";

const MIN_TEMP: i32 = -15;
const MAX_TEMP: i32 = 40;

/// Condition for a temperature in degrees celsius.
pub fn condition_for(temp: i32) -> &'static str {
    if temp < 0 {
        "snowing"
    } else if temp < 25 {
        "raining"
    } else {
        "sunny"
    }
}

pub struct GetWeatherUpdateTool {
    rng: Mutex<StdRng>,
}

impl GetWeatherUpdateTool {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic readings for tests.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn next_temperature(&self) -> Result<i32, ToolError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| ToolError::ExecutionFailed("weather rng poisoned".to_string()))?;
        Ok(rng.gen_range(MIN_TEMP..=MAX_TEMP))
    }
}

impl Default for GetWeatherUpdateTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for GetWeatherUpdateTool {
    fn name(&self) -> &str {
        TOOL_GET_WEATHER_UPDATE
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: TOOL_GET_WEATHER_UPDATE.to_string(),
            description: Some(
                "Get the weather for a city at a given date and time.".to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "city": {
                        "type": "string",
                        "description": "Name of the city and the country, e.g. San Luis, Batangas, Philippines."
                    },
                    "date": {
                        "type": "string",
                        "format": "date-time",
                        "description": "Date and time, e.g. 2025-10-18T14:00:00."
                    }
                },
                "required": ["city", "date"]
            }),
        }
    }

    async fn call(
        &self,
        args: Value,
        _ctx: Option<&ToolCallContext>,
    ) -> Result<ToolCallContent, ToolError> {
        let city = args
            .get("city")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidArguments("missing city".to_string()))?;
        let raw_date = args
            .get("date")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidArguments("missing date".to_string()))?;
        let date = parse_date_time(raw_date).ok_or_else(|| {
            ToolError::InvalidArguments(format!("unparseable date: {}", raw_date))
        })?;
        let temp = self.next_temperature()?;
        Ok(ToolCallContent::text(format!(
            "It is {}: {} degrees celsius in {} at {}",
            condition_for(temp),
            temp,
            city,
            date.format("%Y-%m-%d %H:%M:%S")
        )))
    }
}
