use std::fmt::Write as _;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::forecast::{
    service::{ForecastService, ResolvedForecast},
    ForecastSource, Geocoder,
};
use crate::utils::{format_fahrenheit, format_forecast_date};

const APP_NAME: &str = "World's Best Weather App";
const RULE: &str = "---------------------------";

/// Read addresses from `input` until `q` or end of input, writing forecasts to `output`.
///
/// Lookup errors are printed and the loop continues.
pub async fn run<G, F, R, W>(
    service: &ForecastService<G, F>,
    input: R,
    mut output: W,
) -> std::io::Result<()>
where
    G: Geocoder,
    F: ForecastSource,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    output
        .write_all(format!("{}\n{}\n", APP_NAME, RULE).as_bytes())
        .await?;

    let mut lines = input.lines();
    loop {
        output.write_all(prompt().as_bytes()).await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let address = line.trim();

        if address.eq_ignore_ascii_case("q") {
            break;
        }
        if address.is_empty() {
            continue;
        }

        let text = match service.resolve_forecast(address).await {
            Ok(resolved) => render_forecast(&resolved),
            Err(e) => {
                tracing::warn!("Lookup failed for {:?}: {}", address, e);
                format!("{}\n", e)
            }
        };
        output.write_all(text.as_bytes()).await?;
    }

    output
        .write_all(format!("Thanks for using the {}!\n", APP_NAME).as_bytes())
        .await?;
    output.flush().await
}

fn prompt() -> String {
    "To exit please enter q\nOtherwise, please enter your address\n-> ".to_string()
}

/// Render today's summary followed by the extended forecast.
pub fn render_forecast(resolved: &ResolvedForecast) -> String {
    let mut out = String::new();
    match write_forecast(&mut out, resolved) {
        Ok(()) => out,
        Err(_) => "Forecast data could not be rendered.\n".to_string(),
    }
}

fn write_forecast(out: &mut String, resolved: &ResolvedForecast) -> std::fmt::Result {
    let snapshot = &resolved.snapshot;
    let Some(today) = snapshot.today() else {
        return writeln!(out, "Forecast data is unavailable. Please try again!");
    };

    writeln!(out)?;
    if resolved.served_from_cache {
        writeln!(out, "***Retrieved forecast from cache***")?;
    }
    writeln!(out, "Here is the weather for address: {}", resolved.canonical_address)?;
    writeln!(out, "{}", RULE)?;
    writeln!(
        out,
        "The current temperature is {}",
        format_fahrenheit(snapshot.current_temperature)
    )?;
    writeln!(out, "The high for today is {}", format_fahrenheit(today.max_temperature))?;
    writeln!(out, "The low for today is {}\n", format_fahrenheit(today.min_temperature))?;

    writeln!(out, "Extended Forecast:")?;
    writeln!(out, "{}", RULE)?;
    for day in &snapshot.daily {
        writeln!(out, "{}", format_forecast_date(&day.date))?;
        writeln!(out, "Max Temp: {}", format_fahrenheit(day.max_temperature))?;
        writeln!(out, "Min Temp: {}", format_fahrenheit(day.min_temperature))?;
        writeln!(out, "--------------------")?;
    }
    writeln!(out)
}
