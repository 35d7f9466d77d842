use std::sync::{Arc, Mutex};

use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// How the fake server answers a request.
pub enum Reply {
    Result(Value),
    Error(String),

    /// Left unanswered until a [Wake](Reply::Wake).
    Park,

    /// Answers this request and every parked one with the same result.
    Wake(Value),
}

/// Delve JSON-RPC server answering from a handler, for a single client.
pub struct FakeServer {
    pub addr: String,
    requests: Arc<Mutex<Vec<(String, Value)>>>,
    hangup: Arc<Notify>,
    task: JoinHandle<()>,
}

impl FakeServer {
    pub async fn spawn<F>(handler: F) -> Self
    where
        F: Fn(&str, &Value) -> Reply + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let requests = Arc::new(Mutex::new(Vec::new()));
        let hangup = Arc::new(Notify::new());

        let task = tokio::spawn({
            let requests = Arc::clone(&requests);
            let hangup = Arc::clone(&hangup);

            async move {
                let Ok((stream, _)) = listener.accept().await else {
                    return;
                };
                let (read, mut write) = stream.into_split();
                let mut lines = BufReader::new(read).lines();
                let mut parked = Vec::new();

                loop {
                    let line = tokio::select! {
                        line = lines.next_line() => line,
                        () = hangup.notified() => break,
                    };
                    let Ok(Some(line)) = line else { break };

                    let req: Value = serde_json::from_str(&line).unwrap();
                    let method = req["method"]
                        .as_str()
                        .unwrap()
                        .trim_start_matches("RPCServer.")
                        .to_owned();
                    let params = req["params"][0].clone();
                    let id = req["id"].clone();

                    requests
                        .lock()
                        .unwrap()
                        .push((method.clone(), params.clone()));

                    let replies: Vec<Value> = match handler(&method, &params) {
                        Reply::Result(res) => vec![json!({"id": id, "result": res, "error": null})],
                        Reply::Error(msg) => vec![json!({"id": id, "result": null, "error": msg})],
                        Reply::Park => {
                            parked.push(id);
                            continue;
                        }
                        Reply::Wake(res) => parked
                            .drain(..)
                            .chain([id])
                            .map(|id| json!({"id": id, "result": res, "error": null}))
                            .collect(),
                    };

                    for reply in replies {
                        let line = format!("{reply}\n");
                        if write.write_all(line.as_bytes()).await.is_err() {
                            return;
                        }
                    }
                }
            }
        });

        Self {
            addr,
            requests,
            hangup,
            task,
        }
    }

    /// Closes the client connection.
    pub fn hang_up(&self) {
        self.hangup.notify_one();
    }

    /// Returns the methods called so far, in order.
    pub fn methods(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(method, _)| method.clone())
            .collect()
    }

    /// Returns the parameters of the calls to the given method.
    pub fn params_of(&self, method: &str) -> Vec<Value> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _)| m == method)
            .map(|(_, params)| params.clone())
            .collect()
    }
}

impl Drop for FakeServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Result of a `Command` or `State` call, stopped on goroutine 1.
pub fn stopped(pid: i64) -> Value {
    json!({"State": {
        "Pid": pid,
        "currentThread": {"id": 1, "file": "/src/app/main.go", "line": 10, "goroutineID": 1},
        "currentGoroutine": {"id": 1, "threadID": 1},
        "Threads": [{"id": 1, "file": "/src/app/main.go", "line": 10, "goroutineID": 1}]
    }})
}
