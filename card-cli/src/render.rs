use card_core::{RefreshPhase, ThemeName, WidgetState};
use chrono::{Datelike, Timelike};

/// Format the card as plain text.
pub fn card(state: &WidgetState, theme: ThemeName) -> String {
    let obs = &state.view.observation;
    let fc = &state.view.forecast;

    let status = match &state.phase {
        RefreshPhase::Idle => "updated",
        RefreshPhase::Refreshing => "loading…",
        RefreshPhase::Failed { .. } => "update failed, showing last data",
    };

    let mut out = String::new();
    out.push_str(&format!("{}\n", obs.location_name));
    out.push_str(&format!("{} {}\n", fc.description, fc.comfortability));
    out.push_str(&format!("{} °C\n", whole_degrees(obs.temperature)));
    out.push_str(&format!("wind {} m/s\n", obs.wind_speed));
    out.push_str(&format!("rain {}%\n", fc.rain_possibility));
    out.push_str(&format!(
        "observed {} ({status}) [{theme}]\n",
        observation_stamp(&state.view.observation.observation_time)
    ));
    out
}

/// Halves round up and a negative result that rounds to zero prints as `0`.
fn whole_degrees(celsius: f64) -> f64 {
    let rounded = (celsius + 0.5).floor();
    if rounded == 0.0 { 0.0 } else { rounded }
}

/// `2021/6/1 13:40`, matching the zh-TW short date the card has always shown.
fn observation_stamp(time: &chrono::NaiveDateTime) -> String {
    format!(
        "{}/{}/{} {:02}:{:02}",
        time.year(),
        time.month(),
        time.day(),
        time.hour(),
        time.minute()
    )
}
