use crate::state::{DeviceRecord, DeviceSweep, Overview};
use serde_json::Value;

const STYLE: &str = r#"
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; margin: 0; padding: 20px; background: #f5f5f5; }
        .container { max-width: 900px; margin: 0 auto; background: white; padding: 30px; border-radius: 8px; box-shadow: 0 2px 8px rgba(0,0,0,0.1); }
        nav a { margin-right: 16px; color: #007bff; text-decoration: none; }
        nav a.active { font-weight: bold; border-bottom: 2px solid #007bff; }
        table { border-collapse: collapse; width: 100%; margin-bottom: 24px; }
        th, td { text-align: left; padding: 6px 10px; border-bottom: 1px solid #eee; }
        .ok { color: #28a745; font-weight: bold; }
        .down { color: #dc3545; font-weight: bold; }
        .muted { color: #888; }
        pre { margin: 0; white-space: pre-wrap; }
"#;

pub fn render_home(overview: &Overview) -> String {
    let local = &overview.local;
    let server = &overview.server;

    let status_rows = match &server.status_payload {
        Some(payload) if !payload.is_empty() => payload
            .iter()
            .map(|(key, value)| {
                format!(
                    "<tr><th>{}</th><td><pre>{}</pre></td></tr>",
                    escape_html(key),
                    escape_html(&display_value(value))
                )
            })
            .collect::<String>(),
        Some(_) => r#"<tr><td class="muted">Status payload is empty</td></tr>"#.to_string(),
        None => r#"<tr><td class="muted">No status available</td></tr>"#.to_string(),
    };

    let notes = if overview.notes.notes.is_empty() {
        r#"<li class="muted">No notes</li>"#.to_string()
    } else {
        overview
            .notes
            .notes
            .iter()
            .map(|note| format!("<li>{}</li>", escape_html(&note_label(note))))
            .collect::<String>()
    };

    let body = format!(
        r#"<h2>This machine</h2>
<table>
<tr><th>Hostname</th><td>{hostname}</td></tr>
<tr><th>Kernel</th><td>{kernel}</td></tr>
<tr><th>Uptime</th><td>{uptime}</td></tr>
<tr><th>Disk (/)</th><td><pre>{disk}</pre></td></tr>
<tr><th>Internet</th><td>{internet}</td></tr>
</table>
<h2>Server <span class="muted">{server_url}</span></h2>
<table>
<tr><th>API</th><td>{reachable}</td></tr>
</table>
<table>
{status_rows}
</table>
<h2>Notes ({count})</h2>
<ul>
{notes}
</ul>"#,
        hostname = escape_html(&local.hostname),
        kernel = escape_html(&local.kernel_info),
        uptime = escape_html(&local.uptime),
        disk = escape_html(&local.disk_root_summary),
        internet = reachability(local.internet_reachable),
        server_url = escape_html(&overview.server_url),
        reachable = reachability(server.reachable),
        status_rows = status_rows,
        count = overview.notes.count,
        notes = notes,
    );

    page("Home Dashboard", "home", &overview.generated_at, &body)
}

pub fn render_devices(sweep: &DeviceSweep) -> String {
    let rows = if sweep.devices.is_empty() {
        r#"<tr><td colspan="3" class="muted">No devices responded</td></tr>"#.to_string()
    } else {
        sweep.devices.iter().map(device_row).collect::<String>()
    };

    let last_host = sweep.host_range_end.saturating_sub(1);
    let body = format!(
        r#"<h2>Devices on {prefix}{start} &ndash; {prefix}{last}</h2>
<p class="muted">{found} of {scanned} addresses responded</p>
<table>
<tr><th>Name</th><th>IP</th><th>Latency</th></tr>
{rows}
</table>"#,
        prefix = escape_html(&sweep.network_prefix),
        start = sweep.host_range_start,
        last = last_host,
        found = sweep.devices.len(),
        scanned = sweep.scanned,
        rows = rows,
    );

    page("Devices - Home Dashboard", "devices", &sweep.generated_at, &body)
}

fn device_row(device: &DeviceRecord) -> String {
    let latency = device
        .latency_milliseconds
        .map(|ms| format!("{ms} ms"))
        .unwrap_or_else(|| "n/a".to_string());
    format!(
        "<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
        escape_html(&device.name),
        escape_html(&device.ip_address),
        latency
    )
}

fn page(title: &str, active_tab: &str, generated_at: &str, body: &str) -> String {
    let tab = |id: &str, href: &str, label: &str| {
        let class = if id == active_tab { r#" class="active""# } else { "" };
        format!(r#"<a href="{href}"{class}>{label}</a>"#)
    };
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>{style}</style>
</head>
<body>
<div class="container">
<nav>{home}{devices}</nav>
<h1>{title}</h1>
{body}
<p class="muted">Generated at {generated_at}</p>
</div>
</body>
</html>
"#,
        title = escape_html(title),
        style = STYLE,
        home = tab("home", "/", "Home"),
        devices = tab("devices", "/devices", "Devices"),
        body = body,
        generated_at = escape_html(generated_at),
    )
}

fn reachability(up: bool) -> &'static str {
    if up {
        r#"<span class="ok">Reachable</span>"#
    } else {
        r#"<span class="down">Unreachable</span>"#
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn note_label(note: &Value) -> String {
    ["title", "name", "text"]
        .iter()
        .find_map(|key| note.get(key).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| display_value(note))
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{LocalStatus, NotesSummary, ServerStatus};
    use serde_json::json;

    fn overview() -> Overview {
        Overview {
            local: LocalStatus {
                hostname: "<box>".to_string(),
                kernel_info: "Linux".to_string(),
                uptime: "error: failed to run uptime".to_string(),
                disk_root_summary: "/dev/sda1 40%".to_string(),
                internet_reachable: true,
                captured_at_epoch_seconds: 1,
            },
            server: ServerStatus {
                reachable: true,
                status_payload: json!({"load": 0.5, "motd": "hi"}).as_object().cloned(),
            },
            notes: NotesSummary {
                count: 2,
                notes: vec![json!({"title": "groceries"}), json!(42)],
            },
            server_url: "http://srv:5000".to_string(),
            generated_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn home_escapes_and_lists_notes() {
        let html = render_home(&overview());
        assert!(html.contains("&lt;box&gt;"));
        assert!(!html.contains("<box>"));
        assert!(html.contains("<li>groceries</li>"));
        assert!(html.contains("<li>42</li>"));
        assert!(html.contains("<pre>hi</pre>"));
        assert!(html.contains(r#"<a href="/" class="active">Home</a>"#));
    }

    #[test]
    fn devices_page_handles_empty_sweep() {
        let sweep = DeviceSweep {
            devices: vec![],
            network_prefix: "10.0.0.".to_string(),
            host_range_start: 1,
            host_range_end: 50,
            scanned: 49,
            generated_at: "now".to_string(),
        };
        let html = render_devices(&sweep);
        assert!(html.contains("No devices responded"));
        assert!(html.contains("10.0.0.1 &ndash; 10.0.0.49"));
        assert!(html.contains(r#"<a href="/devices" class="active">Devices</a>"#));
    }

    #[test]
    fn missing_latency_renders_placeholder() {
        let row = device_row(&DeviceRecord {
            name: "TV".to_string(),
            ip_address: "10.0.0.30".to_string(),
            reachable: true,
            latency_milliseconds: None,
        });
        assert!(row.contains("<td>n/a</td>"));
    }
}
