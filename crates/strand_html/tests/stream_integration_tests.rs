//! Integration tests for progressive rendering.

use std::time::Duration;

use futures::StreamExt;
use strand_html::{
    html, raw, wire, write_stream, ChannelSink, RenderConfig, Renderer, Value, WriterSink,
};
use tokio::sync::mpsc;
use tokio::time::{sleep, Instant};

fn sequential() -> Renderer {
    Renderer::new(RenderConfig::default().sequential_ids())
}

fn delayed(ms: u64, text: &'static str) -> Value {
    Value::pending(async move {
        sleep(Duration::from_millis(ms)).await;
        text
    })
}

#[tokio::test(start_paused = true)]
async fn test_chunks_arrive_in_completion_order() {
    let template = html!(
        "<p>" {delayed(30, "A")} "</p>"
        "<p>" {delayed(50, "B")} "</p>"
        "<p>" {delayed(10, "C")} "</p>"
    )
    .unwrap();

    let chunks: Vec<String> = sequential().render_stream(&template).collect().await;

    assert_eq!(
        chunks,
        vec![
            "<p><slot id=\"async_0\">Loading...</slot></p>\
             <p><slot id=\"async_1\">Loading...</slot></p>\
             <p><slot id=\"async_2\">Loading...</slot></p>"
                .to_string(),
            "<template id=\"async_2_content\">C</template>".to_string(),
            "<template id=\"async_0_content\">A</template>".to_string(),
            "<template id=\"async_1_content\">B</template>".to_string(),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_shell_is_not_delayed_by_slow_values() {
    let block = |ms: u64, title: &'static str| {
        Value::try_pending(async move {
            sleep(Duration::from_millis(ms)).await;
            html!("<section><h2>" {title} "</h2></section>")
        })
    };
    let template = html!(
        "<main>"
        {block(1000, "News")}
        {block(5000, "Weather")}
        {block(3000, "Sports")}
        "</main>"
    )
    .unwrap();

    let start = Instant::now();
    let stream = sequential().render_stream(&template);
    futures::pin_mut!(stream);

    let mut arrivals = Vec::new();
    while let Some(chunk) = stream.next().await {
        arrivals.push((start.elapsed(), chunk));
    }

    assert_eq!(arrivals.len(), 4);
    assert!(arrivals[0].0 < Duration::from_millis(100));
    assert_eq!(wire::slot_ids(&arrivals[0].1), vec!["async_0", "async_1", "async_2"]);

    let expected = [(1000, "async_0", "News"), (3000, "async_2", "Sports"), (5000, "async_1", "Weather")];
    for ((elapsed, chunk), (ms, id, title)) in arrivals[1..].iter().zip(expected) {
        assert!(*elapsed >= Duration::from_millis(ms));
        assert!(*elapsed < Duration::from_millis(ms + 100));
        assert_eq!(wire::parse_wrapper_id(chunk), Some(id));
        assert!(chunk.contains(title));
    }
}

#[tokio::test(start_paused = true)]
async fn test_nested_slots_are_streamed() {
    let outer = Value::try_pending(async {
        sleep(Duration::from_millis(10)).await;
        html!("<div>" {delayed(20, "inner")} "</div>")
    });
    let template = html!({outer} {delayed(20, "sibling")}).unwrap();

    let chunks: Vec<String> = sequential().render_stream(&template).collect().await;

    assert_eq!(chunks.len(), 4);
    assert_eq!(wire::slot_ids(&chunks[0]), vec!["async_0", "async_1"]);
    assert_eq!(
        chunks[1],
        "<template id=\"async_0_content\"><div><slot id=\"async_2\">Loading...</slot></div></template>"
    );
    assert_eq!(chunks[2], "<template id=\"async_1_content\">sibling</template>");
    assert_eq!(chunks[3], "<template id=\"async_2_content\">inner</template>");
}

#[tokio::test(start_paused = true)]
async fn test_rejection_does_not_stop_the_stream() {
    let failing = Value::try_pending(async {
        sleep(Duration::from_millis(50)).await;
        Err::<String, _>("upstream timeout")
    });
    let template = html!("<ol>" {delayed(100, "ok")} {failing} "</ol>").unwrap();

    let chunks: Vec<String> = sequential().render_stream(&template).collect().await;

    assert_eq!(chunks.len(), 3);
    assert_eq!(
        chunks[1],
        "<template id=\"async_1_content\">\
         <div class=\"slot-error\" role=\"alert\">Failed to load content</div></template>"
    );
    assert_eq!(chunks[2], "<template id=\"async_0_content\">ok</template>");
}

#[tokio::test(start_paused = true)]
async fn test_timed_out_slot_streams_error_fragment() {
    let renderer = Renderer::new(
        RenderConfig::default()
            .sequential_ids()
            .timeout(200)
            .expose_error_details(true),
    );
    let template = html!({delayed(10_000, "late")}).unwrap();

    let chunks: Vec<String> = renderer.render_stream(&template).collect().await;

    assert_eq!(chunks.len(), 2);
    assert_eq!(wire::parse_wrapper_id(&chunks[1]), Some("async_0"));
    assert!(chunks[1].contains("timed out after 200ms"));
}

#[tokio::test(start_paused = true)]
async fn test_write_stream_to_writer() {
    let template = html!("<h1>" {delayed(5, "Title")} "</h1>").unwrap();
    let mut sink = WriterSink::new(Vec::new());

    let delivered = write_stream(sequential().render_stream(&template), &mut sink)
        .await
        .unwrap();

    assert_eq!(delivered, 2);
    assert_eq!(
        String::from_utf8(sink.into_inner()).unwrap(),
        "<h1><slot id=\"async_0\">Loading...</slot></h1>\
         <template id=\"async_0_content\">Title</template>"
    );
}

#[tokio::test]
async fn test_write_stream_to_channel() {
    let template = html!("<p>" {Value::pending(async { "done" })} "</p>" {raw("<br>")}).unwrap();
    let (tx, mut rx) = mpsc::channel(8);

    let producer = tokio::spawn(async move {
        let mut sink = ChannelSink::new(tx);
        write_stream(sequential().render_stream(&template), &mut sink).await
    });

    let mut received = Vec::new();
    while let Some(chunk) = rx.recv().await {
        received.push(chunk);
    }

    assert_eq!(producer.await.unwrap().unwrap(), 2);
    assert_eq!(received[0], "<p><slot id=\"async_0\">Loading...</slot></p><br>");
    assert_eq!(received[1], "<template id=\"async_0_content\">done</template>");
}

#[tokio::test(start_paused = true)]
async fn test_slot_resolving_to_two_slots() {
    let layout = Value::try_pending(async {
        sleep(Duration::from_millis(10)).await;
        html!(
            "<nav>" {delayed(40, "menu")} "</nav>"
            "<article>" {delayed(20, "body")} "</article>"
        )
    });
    let template = html!("<main>" {layout} "</main>").unwrap();

    let chunks: Vec<String> = sequential().render_stream(&template).collect().await;

    assert_eq!(
        chunks,
        vec![
            "<main><slot id=\"async_0\">Loading...</slot></main>".to_string(),
            "<template id=\"async_0_content\">\
             <nav><slot id=\"async_1\">Loading...</slot></nav>\
             <article><slot id=\"async_2\">Loading...</slot></article></template>"
                .to_string(),
            "<template id=\"async_2_content\">body</template>".to_string(),
            "<template id=\"async_1_content\">menu</template>".to_string(),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_fragment_reused_in_stream() {
    let card = html!("<b>" {delayed(10, "hi")} "</b>").unwrap();
    let page = html!({&card} {&card}).unwrap();

    let chunks: Vec<String> = sequential().render_stream(&page).collect().await;

    assert_eq!(chunks.len(), 3);
    let mut wrappers = chunks[1..].to_vec();
    wrappers.sort();
    assert_eq!(
        wrappers,
        vec![
            "<template id=\"async_0_content\">hi</template>".to_string(),
            "<template id=\"async_1_content\">hi</template>".to_string(),
        ]
    );

    let again = html!("<p>" {&card} "</p>").unwrap();
    let chunks: Vec<String> = sequential().render_stream(&again).collect().await;
    assert_eq!(chunks[1], "<template id=\"async_0_content\">hi</template>");
}
