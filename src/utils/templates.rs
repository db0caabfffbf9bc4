// Gabarit HTML commun aux emails (bienvenue/OTP, mot de passe oublié, reset réussi)

pub struct TemplateData<'a> {
    pub title: &'a str,
    pub message: &'a str,
    pub link: &'a str,
    pub btn_title: &'a str,
}

pub fn render(data: &TemplateData<'_>) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>{title}</title>
  </head>
  <body style="margin:0;padding:0;background:#f4f4f4;font-family:Arial,sans-serif;">
    <table role="presentation" width="100%" cellspacing="0" cellpadding="0">
      <tr>
        <td align="center" style="padding:40px 0;">
          <table role="presentation" width="600" style="background:#ffffff;border-radius:8px;">
            <tr>
              <td style="padding:32px;text-align:center;">
                <h1 style="color:#272727;">PanMusic</h1>
                <h2 style="color:#272727;">{title}</h2>
                <p style="color:#555555;line-height:1.5;">{message}</p>
                <a href="{link}" style="display:inline-block;margin-top:16px;padding:12px 24px;background:#3b82f6;color:#ffffff;text-decoration:none;border-radius:4px;font-weight:bold;">{btn_title}</a>
              </td>
            </tr>
          </table>
        </td>
      </tr>
    </table>
  </body>
</html>"#,
        title = escape(data.title),
        message = escape(data.message),
        link = escape(data.link),
        btn_title = escape(data.btn_title),
    )
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
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
