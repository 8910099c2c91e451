//! HTML and JSON bodies served by the mocked WaterSmart portal.
//!
//! The pages keep only the parts of the real portal markup that the
//! extractor reads, wrapped in enough surrounding layout to make sure
//! unrelated elements are ignored.

/// Landing page of a single-meter account in the standard layout.
pub fn login_success_html(account_number: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>WaterSmart</title></head>
<body>
    <header><a href="/index.php/trackUsage">Track Usage</a></header>
    <div id="account-navigation">
        <ul>
            <li>
                <h5>Service Address</h5>
                123 N Main St
            </li>
            <li>
                <h5>Account Number</h5>
                {}
            </li>
        </ul>
    </div>
    <div class="content">Welcome back!</div>
</body>
</html>"#,
        account_number
    )
}

/// Landing page of an account with two meters and a combined view.
pub fn login_success_multimeter_html() -> String {
    r#"<!DOCTYPE html>
<html>
<head><title>WaterSmart</title></head>
<body>
    <div class="user-picker">
        <div class="account">2 Accounts</div>
        <a href="/index.php/userPicker/pick?userID=13089&amp;residenceID=11499&amp;combined=0&amp;returnUrlOverride=">
            <div class="inline">
                <h3>123 N Main St</h3>
                <div class="account">1234567-8900</div>
            </div>
        </a>
        <a href="/index.php/userPicker/pick?userID=13090&amp;residenceID=11500&amp;combined=0&amp;returnUrlOverride=">
            <div class="inline">
                <h3>456 S Oak Ave</h3>
                <div class="account">9876543-2100</div>
            </div>
        </a>
        <a href="/index.php/userPicker/pick?userID=13089&amp;residenceID=11499&amp;combined=1&amp;returnUrlOverride=">
            <div class="inline">
                <h3>All Accounts</h3>
            </div>
        </a>
    </div>
</body>
</html>"#
        .to_string()
}

/// Landing page whose layout matches neither known structure.
pub fn login_structure_change_html() -> String {
    r#"<!DOCTYPE html>
<html>
<body>
    <div id="account-navigation">
        <div>No title here</div>
    </div>
</body>
</html>"#
        .to_string()
}

/// Login form re-rendered with an error banner.
pub fn login_error_html(message: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<body>
    <form method="post" action="/index.php/welcome/login">
        <div class="error-message">{}</div>
        <input type="email" name="email" value="">
        <input type="password" name="password" value="">
    </form>
</body>
</html>"#,
        message
    )
}

/// Intermediate login page asking for the refresh token to be posted back.
pub fn login_refreshtoken_html(token: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<body>
    <form method="post" action="/index.php/welcome/login?forceEmail=1">
        <input type="hidden" name="token" value="">
        <input type="hidden" name="loginRefreshToken" value="{}">
    </form>
</body>
</html>"#,
        token
    )
}

/// Body of the realtime chart endpoint with four hourly readings,
/// 2024-06-19T19:00Z through 22:00Z.
pub fn realtime_api_response_json() -> String {
    r#"{
    "data": {
        "series": [
            {"read_datetime": 1718823600, "gallons": 7.48, "flags": null, "leak_gallons": 0},
            {"read_datetime": 1718827200, "gallons": 0, "flags": null, "leak_gallons": 0},
            {"read_datetime": 1718830800, "gallons": 7.48, "flags": null, "leak_gallons": 0},
            {"read_datetime": 1718834400, "gallons": 0, "flags": null, "leak_gallons": 0}
        ],
        "units": "gallons"
    },
    "status": "success"
}"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UsageHistoryPayload;

    #[test]
    fn test_login_success_html_embeds_account_number() {
        let html = login_success_html("42-42");
        assert!(html.contains("42-42"));
        assert!(html.contains("account-navigation"));
    }

    #[test]
    fn test_realtime_api_response_json_is_valid_payload() {
        let payload: UsageHistoryPayload =
            serde_json::from_str(&realtime_api_response_json()).unwrap();
        assert_eq!(payload.data.series.len(), 4);
    }
}
