// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use crate::domain::models::product::{Price, Product};
use crate::domain::models::review::Review;
use crate::engines::traits::PageContent;

fn selectors(list: &[&str]) -> Vec<Selector> {
    list.iter()
        .map(|s| Selector::parse(s).expect("static selector must parse"))
        .collect()
}

fn selector(s: &str) -> Selector {
    Selector::parse(s).expect("static selector must parse")
}

// Search result fragments, most specific layout first
static SEARCH_RESULT: Lazy<Vec<Selector>> = Lazy::new(|| {
    selectors(&[
        r#"div[data-component-type="s-search-result"]"#,
        "div.s-result-item[data-asin]",
        "[data-asin]",
    ])
});
static TITLE: Lazy<Vec<Selector>> = Lazy::new(|| {
    selectors(&[
        "h2 a span",
        "h2 span",
        r#"[data-cy="title-recipe-title"]"#,
        "h2",
    ])
});
static LINK: Lazy<Vec<Selector>> =
    Lazy::new(|| selectors(&["h2 a[href]", "a.a-link-normal[href]", "a[href]"]));
static PRICE: Lazy<Vec<Selector>> = Lazy::new(|| {
    selectors(&[
        ".a-price:not(.a-text-price) .a-offscreen",
        ".a-price .a-offscreen",
    ])
});
static PRICE_SYMBOL: Lazy<Selector> = Lazy::new(|| selector(".a-price-symbol"));
static PRICE_WHOLE: Lazy<Selector> = Lazy::new(|| selector(".a-price-whole"));
static PRICE_FRACTION: Lazy<Selector> = Lazy::new(|| selector(".a-price-fraction"));
static RATING: Lazy<Vec<Selector>> = Lazy::new(|| {
    selectors(&[
        ".a-icon-star-small .a-icon-alt",
        ".a-icon-alt",
        r#"[aria-label*="out of 5 stars"]"#,
    ])
});
static REVIEW_COUNT: Lazy<Vec<Selector>> = Lazy::new(|| {
    selectors(&[
        r#"[aria-label$="ratings"]"#,
        r#"[aria-label$="rating"]"#,
        "span.s-underline-text",
        r#"a[href*="customerReviews"] span"#,
    ])
});
static SEARCH_NEXT: Lazy<Vec<Selector>> = Lazy::new(|| {
    selectors(&[
        "a.s-pagination-next",
        "ul.a-pagination li.a-last:not(.a-disabled) a",
    ])
});

static REVIEW_BLOCK: Lazy<Vec<Selector>> = Lazy::new(|| {
    selectors(&[
        r#"div[data-hook="review"]"#,
        r#"li[data-hook="review"]"#,
    ])
});
static REVIEW_AUTHOR: Lazy<Vec<Selector>> =
    Lazy::new(|| selectors(&["span.a-profile-name", r#"[data-hook="review-author"]"#]));
static REVIEW_RATING: Lazy<Vec<Selector>> = Lazy::new(|| {
    selectors(&[
        r#"[data-hook="review-star-rating"] .a-icon-alt"#,
        r#"[data-hook="cmps-review-star-rating"] .a-icon-alt"#,
        r#"[data-hook="review-star-rating"]"#,
    ])
});
static REVIEW_TITLE: Lazy<Selector> = Lazy::new(|| selector(r#"[data-hook="review-title"]"#));
static REVIEW_BODY: Lazy<Vec<Selector>> = Lazy::new(|| {
    selectors(&[
        r#"span[data-hook="review-body"] span"#,
        r#"[data-hook="review-body"]"#,
    ])
});
static REVIEW_DATE: Lazy<Vec<Selector>> =
    Lazy::new(|| selectors(&[r#"[data-hook="review-date"]"#]));
static VERIFIED: Lazy<Selector> = Lazy::new(|| selector(r#"[data-hook="avp-badge"]"#));
static REVIEW_NEXT: Lazy<Vec<Selector>> = Lazy::new(|| {
    selectors(&[
        "ul.a-pagination li.a-last:not(.a-disabled) a",
        r#"a[data-hook="pagination-next"]"#,
    ])
});
static SPAN: Lazy<Selector> = Lazy::new(|| selector("span"));

static FORM: Lazy<Selector> = Lazy::new(|| selector("form"));
static PASSWORD_INPUT: Lazy<Selector> = Lazy::new(|| selector(r#"input[type="password"]"#));
static EMAIL_INPUT: Lazy<Selector> = Lazy::new(|| {
    selector(r#"input[type="email"], input[name="email"], input[type="text"]"#)
});
static HIDDEN_INPUT: Lazy<Selector> = Lazy::new(|| selector(r#"input[type="hidden"]"#));

static AMOUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d[\d,]*(?:\.\d+)?").expect("static regex must compile"));
static COUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d[\d,]*(?:\.\d+)?)\s*([KkMm])?").expect("static regex must compile")
});
static PRODUCT_ID_IN_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:/dp/|%2Fdp%2F|/gp/product/|/product/)([A-Z0-9]{10})")
        .expect("static regex must compile")
});

/// 登录表单
#[derive(Debug, Clone, PartialEq)]
pub struct LoginForm {
    /// 表单提交地址（绝对URL）
    pub action: String,
    /// 需要原样回传的隐藏字段
    pub hidden_fields: Vec<(String, String)>,
    pub email_field: String,
    pub password_field: String,
}

/// 解析搜索结果页
///
/// 缺少标题或商品标识的片段会被跳过；价格、评分、评论数缺失时对应字段留空
pub fn parse_search_results(page: &PageContent) -> Vec<Product> {
    let document = Html::parse_document(&page.body);
    let base = Url::parse(&page.url).ok();

    first_matching(&document, &SEARCH_RESULT)
        .into_iter()
        .filter_map(|fragment| match parse_product(fragment, base.as_ref()) {
            Ok(product) => Some(product),
            Err(reason) => {
                debug!(reason, "Skipping search result fragment");
                None
            }
        })
        .collect()
}

/// 搜索结果页是否有“下一页”
pub fn has_next_search_page(page: &PageContent) -> bool {
    has_any(&Html::parse_document(&page.body), &SEARCH_NEXT)
}

/// 解析评论页
///
/// 没有正文的评论会被跳过
pub fn parse_review_page(page: &PageContent, product_id: &str) -> Vec<Review> {
    let document = Html::parse_document(&page.body);

    first_matching(&document, &REVIEW_BLOCK)
        .into_iter()
        .filter_map(|fragment| match parse_review(fragment, product_id) {
            Ok(review) => Some(review),
            Err(reason) => {
                debug!(product_id, reason, "Skipping review fragment");
                None
            }
        })
        .collect()
}

/// 评论页是否有“下一页”
pub fn has_next_review_page(page: &PageContent) -> bool {
    has_any(&Html::parse_document(&page.body), &REVIEW_NEXT)
}

/// 解析登录表单：第一个包含密码输入框的表单
pub fn parse_login_form(page: &PageContent) -> Option<LoginForm> {
    let document = Html::parse_document(&page.body);
    let form = document
        .select(&FORM)
        .find(|form| form.select(&PASSWORD_INPUT).next().is_some())?;

    let password_field = form
        .select(&PASSWORD_INPUT)
        .find_map(|input| input.value().attr("name"))?
        .to_string();
    let email_field = form
        .select(&EMAIL_INPUT)
        .find_map(|input| input.value().attr("name"))
        .unwrap_or("email")
        .to_string();
    let hidden_fields = form
        .select(&HIDDEN_INPUT)
        .filter_map(|input| {
            let name = input.value().attr("name")?;
            let value = input.value().attr("value").unwrap_or_default();
            Some((name.to_string(), value.to_string()))
        })
        .collect();

    let action = form.value().attr("action").unwrap_or_default();
    let action = resolve(Url::parse(&page.url).ok().as_ref(), action)
        .unwrap_or_else(|| page.url.clone());

    Some(LoginForm {
        action,
        hidden_fields,
        email_field,
        password_field,
    })
}

/// 页面是否为登录页（包含密码输入框）
pub fn looks_like_login_page(page: &PageContent) -> bool {
    Html::parse_document(&page.body)
        .select(&PASSWORD_INPUT)
        .next()
        .is_some()
}

fn parse_product(fragment: ElementRef<'_>, base: Option<&Url>) -> Result<Product, &'static str> {
    let title = select_text(fragment, &TITLE).ok_or("missing title")?;

    let url = LINK
        .iter()
        .find_map(|s| fragment.select(s).next())
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| resolve(base, href));

    let id = fragment
        .value()
        .attr("data-asin")
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .or_else(|| url.as_deref().and_then(product_id_from_url))
        .ok_or("missing product id")?;

    let url = url
        .or_else(|| resolve(base, &format!("/dp/{}", id)))
        .unwrap_or_default();

    let mut product = Product::new(id, title, url);
    product.price = parse_fragment_price(fragment);
    if let Some(rating) = select_parsed(fragment, &RATING, parse_rating) {
        product = product.with_rating(rating);
    }
    product.review_count = select_parsed(fragment, &REVIEW_COUNT, parse_count).unwrap_or(0);

    Ok(product)
}

fn parse_review(fragment: ElementRef<'_>, product_id: &str) -> Result<Review, &'static str> {
    let text = select_text(fragment, &REVIEW_BODY).ok_or("missing review text")?;

    Ok(Review {
        product_id: product_id.to_string(),
        author: select_text(fragment, &REVIEW_AUTHOR).unwrap_or_else(|| "Anonymous".to_string()),
        rating: select_parsed(fragment, &REVIEW_RATING, parse_rating),
        title: review_title(fragment),
        text,
        date: select_text(fragment, &REVIEW_DATE),
        verified_purchase: fragment.select(&VERIFIED).next().is_some(),
    })
}

fn review_title(fragment: ElementRef<'_>) -> Option<String> {
    let container = fragment.select(&REVIEW_TITLE).next()?;
    // The title anchor also holds the star icon text
    container
        .select(&SPAN)
        .filter(|span| {
            !span
                .value()
                .classes()
                .any(|c| c == "a-icon-alt" || c == "a-letter-space")
        })
        .map(element_text)
        .filter(|t| !t.is_empty())
        .last()
        .or_else(|| non_empty(element_text(container)))
}

fn parse_fragment_price(fragment: ElementRef<'_>) -> Option<Price> {
    if let Some(text) = select_text(fragment, &PRICE) {
        return parse_price(&text);
    }

    let whole = fragment.select(&PRICE_WHOLE).next().map(element_text)?;
    let fraction = fragment
        .select(&PRICE_FRACTION)
        .next()
        .map(element_text)
        .unwrap_or_default();
    let symbol = fragment
        .select(&PRICE_SYMBOL)
        .next()
        .map(element_text)
        .unwrap_or_default();
    let whole = whole.trim_end_matches('.');
    let text = if fraction.is_empty() {
        format!("{}{}", symbol, whole)
    } else {
        format!("{}{}.{}", symbol, whole, fraction)
    };
    parse_price(&text)
}

/// 解析价格文本，例如 `$1,299.99`
pub fn parse_price(text: &str) -> Option<Price> {
    let text = text.trim();
    let m = AMOUNT.find(text)?;
    let amount: f64 = m.as_str().replace(',', "").parse().ok()?;

    let prefix = text[..m.start()].trim();
    let symbol = if prefix.is_empty() {
        text[m.end()..].trim()
    } else {
        prefix
    };

    Some(Price {
        currency: currency_code(symbol),
        amount,
    })
}

fn currency_code(symbol: &str) -> String {
    let code = match symbol {
        "$" | "US$" | "USD" => "USD",
        "£" | "GBP" => "GBP",
        "€" | "EUR" => "EUR",
        "¥" | "JPY" => "JPY",
        "₹" | "INR" => "INR",
        "C$" | "CA$" | "CAD" => "CAD",
        s if s.len() == 3 && s.chars().all(|c| c.is_ascii_uppercase()) => s,
        _ => "XXX",
    };
    code.to_string()
}

/// 解析评分文本，例如 `4.5 out of 5 stars`
///
/// 数字必须位于开头，`#1 Best Seller` 之类的徽章文本不算评分；超出 [0, 5] 返回 None
pub fn parse_rating(text: &str) -> Option<f32> {
    let m = AMOUNT.find(text.trim()).filter(|m| m.start() == 0)?;
    let rating: f32 = m.as_str().replace(',', ".").parse().ok()?;
    (0.0..=5.0).contains(&rating).then_some(rating)
}

/// 解析计数文本，例如 `1,234 ratings` 或 `(1.2K)`
pub fn parse_count(text: &str) -> Option<u32> {
    let caps = COUNT.captures(text)?;
    let number: f64 = caps.get(1)?.as_str().replace(',', "").parse().ok()?;
    let multiplier = match caps.get(2).map(|m| m.as_str()) {
        Some("K") | Some("k") => 1_000.0,
        Some("M") | Some("m") => 1_000_000.0,
        _ => 1.0,
    };
    let count = (number * multiplier).round();
    (count >= 0.0 && count <= u32::MAX as f64).then_some(count as u32)
}

/// 从商品URL中提取商品标识
pub fn product_id_from_url(url: &str) -> Option<String> {
    PRODUCT_ID_IN_URL
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn first_matching<'a>(document: &'a Html, selectors: &[Selector]) -> Vec<ElementRef<'a>> {
    selectors
        .iter()
        .map(|s| document.select(s).collect::<Vec<_>>())
        .find(|elements| !elements.is_empty())
        .unwrap_or_default()
}

fn has_any(document: &Html, selectors: &[Selector]) -> bool {
    selectors.iter().any(|s| document.select(s).next().is_some())
}

fn select_text(element: ElementRef<'_>, selectors: &[Selector]) -> Option<String> {
    selectors.iter().find_map(|s| {
        element
            .select(s)
            .map(element_text)
            .find(|text| !text.is_empty())
    })
}

/// 依次尝试每个候选元素的 aria-label 与文本，返回第一个能被 `parse` 接受的值
fn select_parsed<T>(
    element: ElementRef<'_>,
    selectors: &[Selector],
    parse: impl Fn(&str) -> Option<T>,
) -> Option<T> {
    selectors.iter().find_map(|s| {
        element.select(s).find_map(|found| {
            found
                .value()
                .attr("aria-label")
                .and_then(|label| parse(label.trim()))
                .or_else(|| parse(&element_text(found)))
        })
    })
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn non_empty(text: String) -> Option<String> {
    (!text.is_empty()).then_some(text)
}

fn resolve(base: Option<&Url>, href: &str) -> Option<String> {
    match base {
        Some(base) => base.join(href).ok().map(|u| u.to_string()),
        None => Url::parse(href).ok().map(|u| u.to_string()),
    }
}

#[cfg(test)]
#[path = "parser_test.rs"]
mod tests;
