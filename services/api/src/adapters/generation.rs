//! services/api/src/adapters/generation.rs
//!
//! This module contains the adapter for the generative AI provider. It
//! implements the `GenerationService` port from the `core` crate on top of
//! the OpenAI chat, image and speech APIs.
//!
//! Generated audio is pushed through the media store before the call
//! returns, so the port always hands back a servable URL. Video generation
//! has no configured provider and reports itself as unsupported.

use std::sync::Arc;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
        CreateImageRequestArgs, CreateSpeechRequest, Image, ImageModel, ImageResponseFormat,
        ImageSize, SpeechModel, Voice,
    },
    Client,
};
use async_trait::async_trait;
use bytes::Bytes;

use courseforge_core::ports::{
    CompletionOptions, GeneratedAudio, GeneratedImage, GeneratedVideo, GenerationService,
    MediaStorageService, PortError, PortResult, StorageResourceKind, StoreOptions, UploadSource,
};

/// Speaking rate used to estimate the duration of synthesized audio.
const WORDS_PER_MINUTE: f32 = 150.0;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `GenerationService` using OpenAI-compatible APIs.
#[derive(Clone)]
pub struct OpenAiGenerationAdapter {
    client: Client<OpenAIConfig>,
    chat_model: String,
    image_model: String,
    tts_voice: Voice,
    storage: Arc<dyn MediaStorageService>,
}

impl OpenAiGenerationAdapter {
    /// Creates a new `OpenAiGenerationAdapter`.
    pub fn new(
        client: Client<OpenAIConfig>,
        chat_model: String,
        image_model: String,
        tts_voice: Voice,
        storage: Arc<dyn MediaStorageService>,
    ) -> Self {
        Self {
            client,
            chat_model,
            image_model,
            tts_voice,
            storage,
        }
    }
}

fn image_size(size: &str) -> ImageSize {
    match size {
        "1792x1024" => ImageSize::S1792x1024,
        "1024x1792" => ImageSize::S1024x1792,
        "512x512" => ImageSize::S512x512,
        "256x256" => ImageSize::S256x256,
        _ => ImageSize::S1024x1024,
    }
}

//=========================================================================================
// `GenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl GenerationService for OpenAiGenerationAdapter {
    /// Runs a single-turn chat completion and returns the raw reply text.
    async fn complete(
        &self,
        instructions: &str,
        options: CompletionOptions,
    ) -> PortResult<String> {
        let messages = vec![ChatCompletionRequestUserMessageArgs::default()
            .content(instructions)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .into()];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.chat_model)
            .messages(messages)
            .temperature(options.temperature)
            .max_completion_tokens(options.max_output_tokens)
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Call the API and manually map the error, which respects the orphan rule.
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| PortError::Unexpected("model returned an empty reply".to_string()))
    }

    async fn generate_image(&self, prompt: &str, size: &str) -> PortResult<GeneratedImage> {
        let request = CreateImageRequestArgs::default()
            .model(ImageModel::Other(self.image_model.clone()))
            .prompt(prompt)
            .n(1)
            .size(image_size(size))
            .response_format(ImageResponseFormat::Url)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self
            .client
            .images()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        let image = response
            .data
            .into_iter()
            .next()
            .ok_or_else(|| PortError::Unexpected("image API returned no images".to_string()))?;

        match image.as_ref() {
            Image::Url { url, .. } => Ok(GeneratedImage {
                url: url.clone(),
                size: size.to_string(),
            }),
            Image::B64Json { .. } => Err(PortError::Unexpected(
                "image API returned inline data instead of a URL".to_string(),
            )),
        }
    }

    /// Synthesizes speech, persists the bytes through the media store and
    /// returns the stored URL.
    async fn generate_audio(&self, text: &str, _voice: &str) -> PortResult<GeneratedAudio> {
        let request = CreateSpeechRequest {
            model: SpeechModel::Tts1Hd,
            input: text.to_string(),
            voice: self.tts_voice.clone(),
            ..Default::default()
        };

        let response = self
            .client
            .audio()
            .speech(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        let audio_bytes = Bytes::from(response.bytes.to_vec());
        let stored = self
            .storage
            .store(
                &UploadSource::Bytes {
                    data: audio_bytes,
                    file_name: "narration.mp3".to_string(),
                },
                &StoreOptions {
                    resource_kind: StorageResourceKind::Image,
                    folder: "generated/audio".to_string(),
                },
            )
            .await?;

        let word_count = text.split_whitespace().count() as f32;
        let duration_seconds = (word_count / WORDS_PER_MINUTE * 60.0).ceil() as u32;

        Ok(GeneratedAudio {
            url: stored.secure_url,
            duration_seconds,
            size_bytes: stored.size_bytes,
        })
    }

    async fn generate_video(&self, _prompt: &str, _duration: u32) -> PortResult<GeneratedVideo> {
        Err(PortError::Unsupported(
            "no video generation provider is configured".to_string(),
        ))
    }
}
