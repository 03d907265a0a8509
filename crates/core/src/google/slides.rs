use crate::error::PipelineError;
use crate::google::auth::GoogleAuth;
use crate::google::{http_client, http_status, send_json};
use crate::slides::layout::{Rgb, SlideSpec, SlideStyle};
use crate::slides::publish::{DeckLink, DeckRenderer, Placeholders};
use anyhow::Context;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

const DEFAULT_BASE_URL: &str = "https://slides.googleapis.com";
const SLIDE_LAYOUT: &str = "TITLE_AND_BODY";

/// Google Slides REST adapter.
pub struct GoogleSlides {
    http: reqwest::Client,
    auth: Arc<GoogleAuth>,
    base_url: String,
}

impl GoogleSlides {
    pub fn new(auth: Arc<GoogleAuth>) -> anyhow::Result<Self> {
        Ok(Self {
            http: http_client("GOOGLE_TIMEOUT_SECS")?,
            auth,
            base_url: std::env::var("SLIDES_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
        })
    }

    fn presentation_url(&self, deck_id: &str) -> String {
        format!(
            "{}/v1/presentations/{deck_id}",
            self.base_url.trim_end_matches('/')
        )
    }

    async fn get<T: for<'de> Deserialize<'de>>(&self, url: String) -> anyhow::Result<T> {
        let token = self.auth.access_token().await?;
        send_json(self.http.get(url).bearer_auth(token), "Slides").await
    }

    async fn batch_update(&self, deck_id: &str, requests: Vec<Value>) -> anyhow::Result<BatchUpdateResponse> {
        let token = self.auth.access_token().await?;
        let url = format!("{}:batchUpdate", self.presentation_url(deck_id));
        let req = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&json!({ "requests": requests }));
        send_json(req, "Slides batchUpdate").await
    }
}

#[async_trait::async_trait]
impl DeckRenderer for GoogleSlides {
    async fn create_presentation(&self, title: &str) -> anyhow::Result<DeckLink> {
        let token = self.auth.access_token().await?;
        let url = format!("{}/v1/presentations", self.base_url.trim_end_matches('/'));
        let req = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&json!({ "title": title }));
        let created: Presentation = send_json(req, "Slides").await?;
        Ok(DeckLink {
            url: edit_url(&created.presentation_id),
            id: created.presentation_id,
            title: title.to_string(),
        })
    }

    async fn ensure_exists(&self, deck_id: &str) -> anyhow::Result<()> {
        let url = format!("{}?fields=presentationId", self.presentation_url(deck_id));
        self.get::<Presentation>(url)
            .await
            .map(|_| ())
            .map_err(|err| deck_lookup_error(deck_id, err))
    }

    async fn create_slide(&self, deck_id: &str, spec: &SlideSpec) -> anyhow::Result<String> {
        let res = self
            .batch_update(deck_id, vec![create_slide_request(spec)])
            .await?;
        res.replies
            .into_iter()
            .next()
            .and_then(|r| r.create_slide)
            .map(|s| s.object_id)
            .context("createSlide reply missing objectId")
    }

    async fn placeholders(&self, deck_id: &str, slide_id: &str) -> anyhow::Result<Placeholders> {
        let url = format!("{}/pages/{slide_id}", self.presentation_url(deck_id));
        let page: Page = self.get(url).await?;
        Ok(find_placeholders(&page))
    }

    async fn insert_text(&self, deck_id: &str, object_id: &str, text: &str) -> anyhow::Result<()> {
        // The API rejects empty insertions.
        if text.is_empty() {
            return Ok(());
        }
        let request = json!({
            "insertText": { "objectId": object_id, "insertionIndex": 0, "text": text }
        });
        self.batch_update(deck_id, vec![request]).await?;
        Ok(())
    }

    async fn update_style(
        &self,
        deck_id: &str,
        slide_id: &str,
        placeholders: &Placeholders,
        style: &SlideStyle,
    ) -> anyhow::Result<()> {
        let requests = style_requests(slide_id, placeholders, style);
        self.batch_update(deck_id, requests).await?;
        Ok(())
    }

    async fn list_slides(&self, deck_id: &str) -> anyhow::Result<Vec<String>> {
        let url = format!("{}?fields=slides.objectId", self.presentation_url(deck_id));
        let deck: Presentation = self.get(url).await?;
        Ok(deck.slides.into_iter().map(|s| s.object_id).collect())
    }

    async fn delete_slides(&self, deck_id: &str, object_ids: &[String]) -> anyhow::Result<()> {
        if object_ids.is_empty() {
            return Ok(());
        }
        let requests = object_ids
            .iter()
            .map(|id| json!({ "deleteObject": { "objectId": id } }))
            .collect();
        self.batch_update(deck_id, requests).await?;
        Ok(())
    }
}

/// 404 on a deck lookup becomes `DeckNotFound`; anything else passes through.
fn deck_lookup_error(deck_id: &str, err: anyhow::Error) -> anyhow::Error {
    if http_status(&err) == Some(StatusCode::NOT_FOUND) {
        PipelineError::DeckNotFound {
            deck_id: deck_id.to_string(),
        }
        .into()
    } else {
        err
    }
}

pub fn edit_url(deck_id: &str) -> String {
    format!("https://docs.google.com/presentation/d/{deck_id}/edit")
}

fn create_slide_request(spec: &SlideSpec) -> Value {
    json!({
        "createSlide": {
            "objectId": spec.object_id,
            "insertionIndex": spec.insertion_index,
            "slideLayoutReference": { "predefinedLayout": SLIDE_LAYOUT }
        }
    })
}

fn rgb_color(c: Rgb) -> Value {
    let [red, green, blue] = c.unit();
    json!({ "red": red, "green": green, "blue": blue })
}

fn text_style_request(object_id: &str, color: Rgb, font_pt: f32, bold: bool) -> Value {
    json!({
        "updateTextStyle": {
            "objectId": object_id,
            "textRange": { "type": "ALL" },
            "style": {
                "foregroundColor": { "opaqueColor": { "rgbColor": rgb_color(color) } },
                "fontSize": { "magnitude": font_pt, "unit": "PT" },
                "bold": bold
            },
            "fields": "foregroundColor,fontSize,bold"
        }
    })
}

fn style_requests(slide_id: &str, placeholders: &Placeholders, style: &SlideStyle) -> Vec<Value> {
    let mut requests = vec![json!({
        "updatePageProperties": {
            "objectId": slide_id,
            "pageProperties": {
                "pageBackgroundFill": {
                    "solidFill": { "color": { "rgbColor": rgb_color(style.background) } }
                }
            },
            "fields": "pageBackgroundFill.solidFill.color"
        }
    })];
    if let Some(title_id) = &placeholders.title_id {
        requests.push(text_style_request(
            title_id,
            style.title_color,
            style.title_font_pt,
            style.title_bold,
        ));
    }
    if let Some(body_id) = &placeholders.body_id {
        requests.push(text_style_request(
            body_id,
            style.body_color,
            style.body_font_pt,
            false,
        ));
    }
    requests
}

fn find_placeholders(page: &Page) -> Placeholders {
    let mut out = Placeholders::default();
    for element in &page.page_elements {
        let Some(kind) = element
            .shape
            .as_ref()
            .and_then(|s| s.placeholder.as_ref())
            .map(|p| p.kind.as_str())
        else {
            continue;
        };
        match kind {
            "TITLE" | "CENTERED_TITLE" if out.title_id.is_none() => {
                out.title_id = Some(element.object_id.clone());
            }
            "BODY" | "SUBTITLE" if out.body_id.is_none() => {
                out.body_id = Some(element.object_id.clone());
            }
            _ => {}
        }
    }
    out
}

#[derive(Debug, Deserialize)]
struct Presentation {
    #[serde(rename = "presentationId", default)]
    presentation_id: String,
    #[serde(default)]
    slides: Vec<PageRef>,
}

#[derive(Debug, Deserialize)]
struct PageRef {
    #[serde(rename = "objectId")]
    object_id: String,
}

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(rename = "pageElements", default)]
    page_elements: Vec<PageElement>,
}

#[derive(Debug, Deserialize)]
struct PageElement {
    #[serde(rename = "objectId")]
    object_id: String,
    shape: Option<Shape>,
}

#[derive(Debug, Deserialize)]
struct Shape {
    placeholder: Option<Placeholder>,
}

#[derive(Debug, Deserialize)]
struct Placeholder {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct BatchUpdateResponse {
    #[serde(default)]
    replies: Vec<Reply>,
}

#[derive(Debug, Deserialize)]
struct Reply {
    #[serde(rename = "createSlide")]
    create_slide: Option<PageRef>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slides::layout::SlideKind;

    #[test]
    fn create_slide_request_carries_id_and_index() {
        let spec = SlideSpec {
            object_id: "content_20240501153000_001".to_string(),
            kind: SlideKind::Content,
            insertion_index: 1,
            title_text: "t".to_string(),
            body_text: "b".to_string(),
            style: SlideStyle::content(),
        };
        assert_eq!(
            create_slide_request(&spec),
            json!({
                "createSlide": {
                    "objectId": "content_20240501153000_001",
                    "insertionIndex": 1,
                    "slideLayoutReference": { "predefinedLayout": "TITLE_AND_BODY" }
                }
            })
        );
    }

    #[test]
    fn placeholders_found_by_type() {
        let page: Page = serde_json::from_value(json!({
            "objectId": "s1",
            "pageElements": [
                { "objectId": "img", "image": {} },
                { "objectId": "t1", "shape": { "placeholder": { "type": "TITLE" } } },
                { "objectId": "b1", "shape": { "placeholder": { "type": "BODY", "index": 0 } } },
                { "objectId": "b2", "shape": { "placeholder": { "type": "BODY", "index": 1 } } }
            ]
        }))
        .unwrap();
        assert_eq!(
            find_placeholders(&page),
            Placeholders {
                title_id: Some("t1".to_string()),
                body_id: Some("b1".to_string()),
            }
        );
    }

    #[test]
    fn style_requests_skip_missing_placeholders() {
        let placeholders = Placeholders {
            title_id: Some("t1".to_string()),
            body_id: None,
        };
        let requests = style_requests("s1", &placeholders, &SlideStyle::summary());
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0]["updatePageProperties"]["objectId"], "s1");

        let text = &requests[1]["updateTextStyle"];
        assert_eq!(text["objectId"], "t1");
        assert_eq!(text["style"]["fontSize"]["magnitude"], 36.0);
        assert_eq!(text["style"]["bold"], true);
        let red = text["style"]["foregroundColor"]["opaqueColor"]["rgbColor"]["red"]
            .as_f64()
            .unwrap();
        assert!((red - f64::from(0xF9u8) / 255.0).abs() < 1e-6);
    }

    #[test]
    fn batch_reply_yields_created_slide_id() {
        let res: BatchUpdateResponse = serde_json::from_value(json!({
            "presentationId": "p",
            "replies": [{ "createSlide": { "objectId": "summary_20240501153000" } }]
        }))
        .unwrap();
        let id = res.replies.into_iter().next().and_then(|r| r.create_slide);
        assert_eq!(id.unwrap().object_id, "summary_20240501153000");
    }

    fn http_error(status: StatusCode) -> anyhow::Error {
        crate::google::GoogleHttpError {
            api: "Slides",
            status,
            body: "{}".to_string(),
        }
        .into()
    }

    #[test]
    fn missing_deck_maps_to_deck_not_found() {
        let err = deck_lookup_error("abc", http_error(StatusCode::NOT_FOUND));
        assert_eq!(
            err.downcast_ref::<PipelineError>(),
            Some(&PipelineError::DeckNotFound {
                deck_id: "abc".to_string()
            })
        );
    }

    #[test]
    fn other_lookup_failures_pass_through() {
        let err = deck_lookup_error("abc", http_error(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(err.downcast_ref::<PipelineError>().is_none());
        assert_eq!(http_status(&err), Some(StatusCode::INTERNAL_SERVER_ERROR));

        let err = deck_lookup_error("abc", anyhow::anyhow!("connection reset"));
        assert!(err.downcast_ref::<PipelineError>().is_none());
    }

    #[test]
    fn edit_url_points_at_presentation() {
        assert_eq!(
            edit_url("abc"),
            "https://docs.google.com/presentation/d/abc/edit"
        );
    }
}
