//! In-memory fake of the remote service for unit tests

use crate::api::{Params, RemoteError, Transport};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

type CallHook = Box<dyn Fn(&str, &Params) + Send + Sync>;

#[derive(Default)]
struct FakeState {
    posts: HashMap<i64, Vec<Value>>,
    comments: HashMap<(i64, i64), Vec<Value>>,
    screen_names: HashMap<String, Value>,
    scripted: HashMap<String, VecDeque<RemoteError>>,
    owner_errors: HashMap<(String, i64), RemoteError>,
    calls: Vec<(String, Params)>,
}

/// Scripted stand-in for the wall and name-lookup methods
#[derive(Default)]
pub(crate) struct FakeVk {
    state: Mutex<FakeState>,
    hook: Mutex<Option<CallHook>>,
}

impl FakeVk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_post(&self, owner: i64, post: Value) {
        self.state().posts.entry(owner).or_default().push(post);
    }

    /// Adds `n` posts with ids `1..=n` whose text is produced by `text`
    pub fn add_posts(&self, owner: i64, n: i64, text: impl Fn(i64) -> String) {
        for id in 1..=n {
            self.add_post(owner, json!({"id": id, "text": text(id)}));
        }
    }

    pub fn add_comment(&self, owner: i64, post_id: i64, comment: Value) {
        self.state()
            .comments
            .entry((owner, post_id))
            .or_default()
            .push(comment);
    }

    pub fn add_screen_name(&self, name: &str, reply: Value) {
        self.state().screen_names.insert(name.to_string(), reply);
    }

    /// The next call of `method` fails with `error`
    pub fn fail_next(&self, method: &str, error: RemoteError) {
        self.state()
            .scripted
            .entry(method.to_string())
            .or_default()
            .push_back(error);
    }

    /// Every call of `method` against `owner` fails with `error`
    pub fn fail_always(&self, method: &str, owner: i64, error: RemoteError) {
        self.state()
            .owner_errors
            .insert((method.to_string(), owner), error);
    }

    /// Runs `hook` on every call before it is served
    pub fn on_call(&self, hook: impl Fn(&str, &Params) + Send + Sync + 'static) {
        *self.hook.lock().unwrap() = Some(Box::new(hook));
    }

    pub fn calls(&self, method: &str) -> Vec<Params> {
        self.state()
            .calls
            .iter()
            .filter(|(m, _)| m == method)
            .map(|(_, p)| p.clone())
            .collect()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.calls(method).len()
    }

    pub fn total_calls(&self) -> usize {
        self.state().calls.len()
    }

    pub fn post_text(&self, owner: i64, post_id: i64) -> Option<String> {
        self.state()
            .posts
            .get(&owner)?
            .iter()
            .find(|p| p["id"] == post_id)
            .and_then(|p| p["text"].as_str().map(str::to_string))
    }

    pub fn comment_text(&self, owner: i64, comment_id: i64) -> Option<String> {
        let state = self.state();
        state
            .comments
            .iter()
            .filter(|((o, _), _)| *o == owner)
            .flat_map(|(_, list)| list.iter())
            .flat_map(|c| {
                let replies = c["thread"]["items"].as_array().cloned().unwrap_or_default();
                std::iter::once(c.clone()).chain(replies)
            })
            .find(|c| c["id"] == comment_id)
            .and_then(|c| c["text"].as_str().map(str::to_string))
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    fn serve(&self, method: &str, params: &Params) -> Result<Value, RemoteError> {
        let mut state = self.state();
        state.calls.push((method.to_string(), params.clone()));

        if let Some(error) = state
            .scripted
            .get_mut(method)
            .and_then(VecDeque::pop_front)
        {
            return Err(error);
        }

        let owner = int(params, "owner_id");
        if let Some(error) = state.owner_errors.get(&(method.to_string(), owner)) {
            return Err(error.clone());
        }

        match method {
            "wall.get" => {
                let posts = state.posts.get(&owner).cloned().unwrap_or_default();
                Ok(page(&posts, params))
            }
            "wall.getComments" => {
                let key = (owner, int(params, "post_id"));
                let comments = state.comments.get(&key).cloned().unwrap_or_default();
                Ok(page(&comments, params))
            }
            "wall.edit" => {
                let post_id = int(params, "post_id");
                let message = params.get("message").unwrap_or_default().to_string();
                let post = state
                    .posts
                    .get_mut(&owner)
                    .and_then(|posts| posts.iter_mut().find(|p| p["id"] == post_id))
                    .ok_or_else(|| RemoteError::api(100, "post not found"))?;
                post["text"] = Value::String(message);
                Ok(json!(1))
            }
            "wall.editComment" => {
                let comment_id = int(params, "comment_id");
                let message = params.get("message").unwrap_or_default().to_string();
                for ((o, _), list) in state.comments.iter_mut() {
                    if *o != owner {
                        continue;
                    }
                    for comment in list.iter_mut() {
                        if comment["id"] == comment_id {
                            comment["text"] = Value::String(message);
                            return Ok(json!(1));
                        }
                        if let Some(replies) = comment
                            .get_mut("thread")
                            .and_then(|t| t.get_mut("items"))
                            .and_then(Value::as_array_mut)
                        {
                            if let Some(reply) = replies.iter_mut().find(|r| r["id"] == comment_id)
                            {
                                reply["text"] = Value::String(message);
                                return Ok(json!(1));
                            }
                        }
                    }
                }
                Err(RemoteError::api(100, "comment not found"))
            }
            "utils.resolveScreenName" => {
                let name = params.get("screen_name").unwrap_or_default();
                Ok(state.screen_names.get(name).cloned().unwrap_or_else(|| json!([])))
            }
            other => Err(RemoteError::api(3, format!("Unknown method: {}", other))),
        }
    }
}

fn int(params: &Params, key: &str) -> i64 {
    params
        .get(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or_default()
}

fn page(items: &[Value], params: &Params) -> Value {
    let offset = int(params, "offset").max(0) as usize;
    let count = int(params, "count").max(0) as usize;
    let slice: Vec<Value> = items.iter().skip(offset).take(count).cloned().collect();
    json!({"count": items.len(), "items": slice})
}

#[async_trait]
impl Transport for FakeVk {
    async fn call(&self, method: &str, params: &Params) -> Result<Value, RemoteError> {
        if let Some(hook) = self.hook.lock().unwrap().as_ref() {
            hook(method, params);
        }
        self.serve(method, params)
    }
}
