use futures_util::future::LocalBoxFuture;
use js_sys::{Array, Uint8Array};
use url::Url;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Blob, BlobPropertyBag, FormData, Headers, RequestInit};

use crate::error::ClientError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormValue {
    Text(String),
    File {
        file_name: String,
        content_type: String,
        bytes: Vec<u8>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormField {
    pub name: String,
    pub value: FormValue,
}

impl FormField {
    pub fn text(name: &str, value: String) -> Self {
        FormField {
            name: name.to_owned(),
            value: FormValue::Text(value),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Body {
    Empty,
    Json(String),
    Form(Vec<FormField>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub bearer: Option<String>,
    pub body: Body,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one request. Only a failure to get any response is an `Err`;
/// status codes are left to the caller.
pub trait Transport {
    fn send(&self, request: Request) -> LocalBoxFuture<'static, Result<Response, ClientError>>;
}

/// `window.fetch`.
pub struct FetchTransport;

impl Transport for FetchTransport {
    fn send(&self, request: Request) -> LocalBoxFuture<'static, Result<Response, ClientError>> {
        Box::pin(fetch(request))
    }
}

fn network(value: JsValue) -> ClientError {
    ClientError::Network(format!("{:?}", value))
}

async fn fetch(request: Request) -> Result<Response, ClientError> {
    let init = RequestInit::new();
    init.set_method(request.method.as_str());

    let headers = Headers::new().map_err(network)?;
    if let Some(token) = &request.bearer {
        headers
            .set("Authorization", &format!("Bearer {}", token))
            .map_err(network)?;
    }

    match request.body {
        Body::Empty => {}
        Body::Json(text) => {
            headers
                .set("Content-Type", "application/json")
                .map_err(network)?;
            init.set_body(&JsValue::from_str(&text));
        }
        // the browser picks the multipart boundary, so no Content-Type here
        Body::Form(fields) => {
            let form = form_data(fields)?;
            init.set_body(&form);
        }
    }
    init.set_headers(&headers);

    let fetch_request =
        web_sys::Request::new_with_str_and_init(request.url.as_str(), &init).map_err(network)?;
    let window = web_sys::window().ok_or_else(|| ClientError::Network("no window".into()))?;

    let response: web_sys::Response = JsFuture::from(window.fetch_with_request(&fetch_request))
        .await
        .map_err(network)?
        .dyn_into()
        .map_err(network)?;

    let body = JsFuture::from(response.text().map_err(network)?)
        .await
        .map_err(network)?
        .as_string()
        .unwrap_or_default();

    Ok(Response {
        status: response.status(),
        body,
    })
}

fn form_data(fields: Vec<FormField>) -> Result<FormData, ClientError> {
    let form = FormData::new().map_err(network)?;

    for field in fields {
        let appended = match field.value {
            FormValue::Text(value) => form.append_with_str(&field.name, &value),
            FormValue::File {
                file_name,
                content_type,
                bytes,
            } => {
                let options = BlobPropertyBag::new();
                options.set_type(&content_type);
                let parts = Array::of1(&Uint8Array::from(bytes.as_slice()));
                let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options)
                    .map_err(network)?;
                form.append_with_blob_and_filename(&field.name, &blob, &file_name)
            }
        };
        appended.map_err(network)?;
    }

    Ok(form)
}
