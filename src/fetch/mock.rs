/*
 *  fetch/mock.rs
 *
 *  yrpaper - forecast to e-paper
 *	(c) 2020-26 Stuart Hunter
 *
 *	Scripted transport for testing without network
 *
 *	This program is free software: you can redistribute it and/or modify
 *	it under the terms of the GNU General Public License as published by
 *	the Free Software Foundation, either version 3 of the License, or
 *	(at your option) any later version.
 *
 *	This program is distributed in the hope that it will be useful,
 *	but WITHOUT ANY WARRANTY; without even the implied warranty of
 *	MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *	GNU General Public License for more details.
 *
 *	See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *	Public License.
 *
 */
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::{AttemptError, HttpResponse, Transport};

/// Mock transport
///
/// Replies from a queue of scripted outcomes; once the queue is drained
/// every request gets the fallback outcome. All requested URLs are recorded.
#[derive(Debug, Clone)]
pub struct MockTransport {
    state: Arc<Mutex<MockTransportState>>,
}

/// Shared state for inspection in tests
#[derive(Debug)]
pub struct MockTransportState {
    pub script: VecDeque<Result<HttpResponse, AttemptError>>,
    pub fallback: Result<HttpResponse, AttemptError>,
    pub requests: Vec<String>,
}

impl Default for MockTransportState {
    fn default() -> Self {
        Self {
            script: VecDeque::new(),
            fallback: Err(AttemptError::Transport("no scripted response".to_string())),
            requests: Vec::new(),
        }
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self { state: Arc::new(Mutex::new(MockTransportState::default())) }
    }

    /// Every request answers with `outcome`.
    pub fn always(outcome: Result<HttpResponse, AttemptError>) -> Self {
        let transport = Self::new();
        transport.state.lock().unwrap().fallback = outcome;
        transport
    }

    /// Queue one outcome ahead of the fallback.
    pub fn push(&self, outcome: Result<HttpResponse, AttemptError>) -> &Self {
        self.state.lock().unwrap().script.push_back(outcome);
        self
    }

    pub fn set_fallback(&self, outcome: Result<HttpResponse, AttemptError>) {
        self.state.lock().unwrap().fallback = outcome;
    }

    pub fn request_count(&self) -> usize {
        self.state.lock().unwrap().requests.len()
    }

    pub fn state(&self) -> Arc<Mutex<MockTransportState>> {
        Arc::clone(&self.state)
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for MockTransport {
    fn get(&self, url: &str) -> Result<HttpResponse, AttemptError> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(url.to_string());
        match state.script.pop_front() {
            Some(outcome) => outcome,
            None => state.fallback.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_then_fallback() {
        let transport = MockTransport::always(Ok(HttpResponse::ok("{}")));
        transport.push(Err(AttemptError::Status(500)));

        assert_eq!(transport.get("a"), Err(AttemptError::Status(500)));
        assert_eq!(transport.get("b"), Ok(HttpResponse::ok("{}")));
        assert_eq!(transport.get("c"), Ok(HttpResponse::ok("{}")));
        assert_eq!(transport.request_count(), 3);
        assert_eq!(transport.state().lock().unwrap().requests[1], "b");
    }
}
