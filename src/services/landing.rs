/*
 * Responsibility
 * - GET / で返す静的ページを起動時に一度だけ組み立てる
 * - client_id / application_name をテンプレートに埋め込む (HTML escape 済み)
 */
use crate::config::ClientConfig;

const TEMPLATE: &str = include_str!("../../templates/index.html");

pub fn render(client: &ClientConfig) -> String {
    TEMPLATE
        .replace("{{CLIENT_ID}}", &escape_html(&client.client_id))
        .replace("{{APPLICATION_NAME}}", &escape_html(&client.application_name))
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
