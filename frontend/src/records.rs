use crate::connection::{FormField, FormValue};

pub type PostId = u64;

/// A post as served by `GET /posts` and `GET /posts/search`.
///
/// Display-only snapshot; the server copy is authoritative.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub author: String,
    pub created_at: String,
}

impl Post {
    /// A null, missing, or empty `image_url` all mean the post has no image.
    pub fn image_path(&self) -> Option<&str> {
        self.image_url.as_deref().filter(|path| !path.is_empty())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Comment {
    pub author: String,
    pub comment: String,
    pub created_at: String,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct NewComment {
    pub comment: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// The new-post form, sent as one multipart request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub image: Option<ImageUpload>,
}

impl NewPost {
    pub fn into_form(self) -> Vec<FormField> {
        let mut fields = vec![
            FormField::text("title", self.title),
            FormField::text("content", self.content),
        ];

        if let Some(image) = self.image {
            fields.push(FormField {
                name: "image".into(),
                value: FormValue::File {
                    file_name: image.file_name,
                    content_type: image.content_type,
                    bytes: image.bytes,
                },
            });
        }

        fields
    }
}
