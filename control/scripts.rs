/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Extraction scripts injected into pages. Each one stringifies its own
//! payload; the handlers re-decode the JSON on the way out.

/// Page overview: title, headings, visible main text, element counts.
pub const PAGE_SUMMARY: &str = r#"
  function getVisibleText(element) {
    var clone = element.cloneNode(true);
    var toRemove = clone.querySelectorAll('style, script, noscript, iframe, svg');
    for (var i = 0; i < toRemove.length; i++) {
      toRemove[i].remove();
    }
    return clone.textContent || clone.innerText || '';
  }

  var mainElement = document.querySelector('main') || document.querySelector('article') ||
                   document.querySelector('[role="main"]') || document.querySelector('.content');
  var mainText = mainElement ? getVisibleText(mainElement) : getVisibleText(document.body);

  return {
    title: document.title,
    url: window.location.href,
    headings: Array.from(document.querySelectorAll('h1,h2,h3')).map(function(h) { return h.textContent.trim(); }).slice(0, 10),
    mainText: mainText.trim().substring(0, 500),
    forms: document.querySelectorAll('form').length,
    links: document.querySelectorAll('a').length,
    buttons: document.querySelectorAll('button, input[type="button"], input[type="submit"]').length,
    inputs: document.querySelectorAll('input, textarea, select').length,
    images: document.querySelectorAll('img').length
  };
"#;

/// Visible interactive elements with geometry for click targeting.
pub const INTERACTIVE_ELEMENTS: &str = r#"
  return (function() {
    const elements = [];
    const selectors = 'a, button, input, select, textarea, [role="button"], [onclick], [tabindex="0"]';

    document.querySelectorAll(selectors).forEach((el, idx) => {
      const rect = el.getBoundingClientRect();

      if (rect.width > 0 && rect.height > 0 &&
          rect.top < window.innerHeight &&
          rect.bottom > 0 &&
          getComputedStyle(el).visibility !== 'hidden' &&
          getComputedStyle(el).display !== 'none') {

        let text = el.textContent?.trim().substring(0, 100) || '';
        if (text.length === 0) {
          text = el.getAttribute('aria-label') ||
                 el.getAttribute('title') ||
                 el.getAttribute('placeholder') ||
                 el.value || '';
        }

        elements.push({
          index: idx,
          tag: el.tagName.toLowerCase(),
          type: el.type || '',
          id: el.id || '',
          className: el.className || '',
          text: text,
          href: el.href || '',
          name: el.name || '',
          placeholder: el.placeholder || '',
          value: el.value || '',
          ariaLabel: el.getAttribute('aria-label') || '',
          role: el.getAttribute('role') || '',
          disabled: el.disabled || false,
          checked: el.checked || false,
          bounds: {
            x: Math.round(rect.x),
            y: Math.round(rect.y),
            width: Math.round(rect.width),
            height: Math.round(rect.height)
          }
        });
      }
    });

    return JSON.stringify(elements);
  })();
"#;

/// Depth-capped semantic tree rooted at `document.body`.
pub const ACCESSIBILITY_TREE: &str = r#"
  return (function() {
    function buildA11yTree(element, depth = 0, maxDepth = 3) {
      if (depth > maxDepth) return null;
      if (!element) return null;

      const tagName = element.tagName.toLowerCase();

      if (['script', 'style', 'noscript', 'meta', 'link'].includes(tagName)) {
        return null;
      }

      const role = element.getAttribute('role') || tagName;
      const rect = element.getBoundingClientRect();

      if (depth === 0 && (rect.width === 0 || rect.height === 0)) {
        return null;
      }

      const node = {
        role: role,
        tag: tagName
      };

      const text = element.getAttribute('aria-label') ||
                   (element.childNodes.length === 1 && element.childNodes[0].nodeType === 3
                     ? element.textContent?.trim().substring(0, 50)
                     : '');
      if (text) node.name = text;

      if (element.id) node.id = element.id;
      if (element.href) node.href = element.href;
      if (element.type) node.type = element.type;
      if (element.value) node.value = element.value;
      if (element === document.activeElement) node.focused = true;
      if (element.disabled) node.disabled = true;
      if (element.getAttribute('aria-hidden') === 'true') node.hidden = true;

      const containerTags = ['main', 'nav', 'header', 'footer', 'section', 'article', 'aside', 'form', 'div', 'ul', 'ol'];
      if (containerTags.includes(tagName) || role === 'navigation' || role === 'main') {
        const children = Array.from(element.children)
          .map(child => buildA11yTree(child, depth + 1, maxDepth))
          .filter(Boolean);

        if (children.length > 0) {
          node.children = children;
        }
      }

      return node;
    }

    return JSON.stringify(buildA11yTree(document.body));
  })();
"#;

/// Viewport-visible click targets for overlaying on a screenshot, capped
/// at 50 entries.
pub const ANNOTATED_SCREENSHOT_ELEMENTS: &str = r#"
  return (function() {
    const elements = [];
    const selectors = 'a, button, input, select, textarea, [role="button"]';

    document.querySelectorAll(selectors).forEach((el, idx) => {
      const rect = el.getBoundingClientRect();

      if (rect.width > 0 && rect.height > 0 &&
          rect.top < window.innerHeight &&
          rect.bottom > 0 &&
          rect.left < window.innerWidth &&
          rect.right > 0 &&
          getComputedStyle(el).visibility !== 'hidden' &&
          getComputedStyle(el).display !== 'none') {

        const text = (el.textContent?.trim() ||
                     el.getAttribute('aria-label') ||
                     el.getAttribute('title') ||
                     el.placeholder ||
                     el.value || '').substring(0, 30);

        elements.push({
          index: idx,
          x: Math.round(rect.x),
          y: Math.round(rect.y),
          width: Math.round(rect.width),
          height: Math.round(rect.height),
          tag: el.tagName.toLowerCase(),
          text: text,
          type: el.type || ''
        });
      }
    });

    return JSON.stringify(elements.slice(0, 50));
  })();
"#;

const QUERY_FORMS: &str = r#"JSON.stringify(Array.from(document.querySelectorAll('form')).map((f, idx) => ({index: idx, action: f.action, method: f.method, name: f.name || '', id: f.id || '', fields: Array.from(f.elements).map(e => ({name: e.name || '', type: e.type || '', id: e.id || '', placeholder: e.placeholder || '', required: e.required || false, value: e.value || '', options: e.tagName.toLowerCase() === 'select' ? Array.from(e.options).map(o => ({text: o.text, value: o.value})) : []}))})))"#;

const QUERY_NAVIGATION: &str = r#"JSON.stringify(Array.from(document.querySelectorAll('nav a, header a, [role="navigation"] a')).map(a => ({text: a.textContent.trim(), href: a.href, title: a.title || ''})))"#;

const QUERY_ARTICLE: &str = r#"JSON.stringify({title: document.title, heading: document.querySelector('h1')?.textContent.trim() || '', content: (document.querySelector('article, main, [role="main"]')?.textContent || document.body.textContent).trim().substring(0, 2000), author: document.querySelector('[rel="author"], .author, .byline')?.textContent.trim() || '', published: document.querySelector('time, [itemprop="datePublished"]')?.textContent.trim() || ''})"#;

const QUERY_TABLES: &str = r#"JSON.stringify(Array.from(document.querySelectorAll('table')).slice(0, 5).map(table => ({caption: table.caption?.textContent.trim() || '', headers: Array.from(table.querySelectorAll('th')).map(th => th.textContent.trim()), rows: Array.from(table.querySelectorAll('tbody tr')).slice(0, 10).map(tr => Array.from(tr.querySelectorAll('td')).map(td => td.textContent.trim()))})))"#;

const QUERY_MEDIA: &str = r#"JSON.stringify({images: Array.from(document.querySelectorAll('img')).slice(0, 20).map(img => ({src: img.src, alt: img.alt || '', title: img.title || ''})), videos: Array.from(document.querySelectorAll('video')).map(v => ({src: v.src || v.currentSrc, poster: v.poster || ''}))})"#;

pub const QUERY_TYPES: &[&str] = &["forms", "navigation", "article", "tables", "media"];

/// Expression for a named content query, wrapped ready for execution.
pub fn content_query(query_type: &str) -> Option<String> {
    let expression = match query_type {
        "forms" => QUERY_FORMS,
        "navigation" => QUERY_NAVIGATION,
        "article" => QUERY_ARTICLE,
        "tables" => QUERY_TABLES,
        "media" => QUERY_MEDIA,
        _ => return None,
    };
    Some(format!("return (function() {{ return {expression}; }})();"))
}
