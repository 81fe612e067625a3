//SPDX-License-Identifier: MIT OR Apache-2.0
/*!
# scoped-mdc

scoped-mdc is a mapped diagnostic context (MDC) for Rust: a thread-local
key/value store that lets every log line emitted during a logical operation
carry structured, JSON-serialized data about that operation - and guarantees
the data is removed precisely when the operation ends, even when the work hops
between threads.

# The problem

A request handler knows the order it is processing; the functions it calls
five frames down do not, yet their log lines are the ones you grep when the
order goes wrong. Threading an "order" argument through every signature just
to enrich logs is invasive, and stuffing it into each log call by hand is
worse. The classic answer is a diagnostic context: put the order into
task-local state once, let the log formatter attach it to every record, drop
it when the handler returns.

Two things make that harder than it sounds:

* values are structured. Serializing them to a JSON *string* field means
  downstream log indexers see one opaque escaped blob instead of queryable
  subfields.
* work moves. A closure queued on a thread pool executes with the pool
  thread's context, not yours - and a pool thread that inherits context and
  never gives it back poisons every later task.

scoped-mdc handles both: payloads are tagged so a JSON formatter can embed
them as real objects, and propagation installs a snapshot for exactly the
duration of the handed-off work, restoring the worker's own state afterward
under a configurable overwrite policy.

# The API

```rust
use scoped_mdc::{MdcContext, store};
use serde::Serialize;

#[derive(Serialize)]
struct OrderInfo {
    id: u64,
    items: u32,
}

let order = OrderInfo { id: 23, items: 3 };
{
    let _ctx = MdcContext::of("order", &order);
    // every log record emitted here can carry the serialized order
    assert!(store::get("order").is_some());
}
// removed again, exactly when the scope ends
assert!(store::get("order").is_none());
```

Handing work to another thread:

```rust
use scoped_mdc::{decorate, MdcContext, OverwriteStrategy, store};

let _ctx = MdcContext::of("order", &23);
let task = decorate(
    || store::get("order").is_some(),
    OverwriteStrategy::PreventOverwrite,
);
assert!(std::thread::spawn(task).join().unwrap());
```

# The pieces

* [`store`] - the thread-local key-to-payload map a formatter reads.
* [`MdcContext`] - the RAII scope handle; serializes on creation, restores on
  drop, reports overwrite misuse.
* [`MdcKeySupplier`] - type-stable keys instead of ad hoc strings.
* [`decorate`] / [`OverwriteStrategy`] - cross-thread propagation for
  closures; [`ApplyMdc`] for futures.
* [`provider`] - renders store contents into a JSON object for a structured
  log formatter, embedding tagged payloads as real JSON values.
* [`Serializer`] / [`set_serializer`] - process-wide override of the JSON
  render stage.
* [`InMemorySubscriber`] - captures this crate's diagnostics in tests.

# What this crate is not

It is not a logging framework. Nothing here formats, routes, or persists log
records; the crate only manages the lifecycle and propagation of the
contextual state an external formatter consumes. Its own diagnostics - and
they are diagnostics about *your* scoping, not errors - go through the
[`tracing`] facade.
*/

mod capture;
pub mod context;
mod decorator;
pub mod provider;
mod serializer;
pub mod store;

pub use capture::{CapturedEvent, InMemorySubscriber};
pub use context::{MdcContext, MdcKeySupplier};
pub use decorator::{ApplyMdc, OverwriteStrategy, decorate};
pub use serializer::{SerializeError, Serializer, reset_serializer, set_serializer};
